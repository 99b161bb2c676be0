use serde::{Deserialize, Serialize};

use crate::{
    layout::Point,
    storage::{is_high_surrogate, is_low_surrogate},
};

use super::Document;

/// A caret position: block index, logical line inside the block, and a
/// UTF-16 offset inside that line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CursorCoord {
    pub block_no: usize,
    pub line_no: usize,
    pub offset: usize,
}

impl CursorCoord {
    pub fn new(block_no: usize, line_no: usize, offset: usize) -> Self {
        Self {
            block_no,
            line_no,
            offset,
        }
    }
}

/// Caret state. Vertical motion remembers the column it started from so a
/// run of up/down presses does not drift on short lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    coord: CursorCoord,
    preferred_x: Option<f32>,
}

impl Cursor {
    pub fn new(coord: CursorCoord) -> Self {
        Self {
            coord,
            preferred_x: None,
        }
    }

    pub fn coord(&self) -> CursorCoord {
        self.coord
    }

    pub fn set_coord(&mut self, coord: CursorCoord) {
        self.coord = coord;
        self.preferred_x = None;
    }

    /// One character left; a surrogate pair counts as one character. Wraps
    /// to the end of the previous line or block.
    pub fn move_left(&mut self, doc: &Document) {
        let c = self.coord;
        let next = if c.offset > 0 {
            let units = doc.line_units(c).unwrap_or_default();
            let pair = c.offset >= 2
                && units.get(c.offset - 1).is_some_and(|&u| is_low_surrogate(u))
                && units.get(c.offset - 2).is_some_and(|&u| is_high_surrogate(u));
            CursorCoord {
                offset: c.offset - if pair { 2 } else { 1 },
                ..c
            }
        } else if c.line_no > 0 {
            let previous = CursorCoord::new(c.block_no, c.line_no - 1, 0);
            let len = doc.line(previous).map(|l| l.len()).unwrap_or(0);
            CursorCoord {
                offset: len,
                ..previous
            }
        } else if c.block_no > 0 {
            doc.block_end(c.block_no - 1).unwrap_or(c)
        } else {
            c
        };
        self.set_coord(next);
    }

    /// One character right, wrapping to the start of the next line or block.
    pub fn move_right(&mut self, doc: &Document) {
        let c = self.coord;
        let Ok(block) = doc.block_layout(c.block_no) else {
            return;
        };
        let units = doc.line_units(c).unwrap_or_default();
        let next = if c.offset < units.len() {
            let pair = units.get(c.offset).is_some_and(|&u| is_high_surrogate(u))
                && units.get(c.offset + 1).is_some_and(|&u| is_low_surrogate(u));
            CursorCoord {
                offset: c.offset + if pair { 2 } else { 1 },
                ..c
            }
        } else if c.line_no + 1 < block.line_count() {
            CursorCoord::new(c.block_no, c.line_no + 1, 0)
        } else if c.block_no + 1 < doc.block_count() {
            CursorCoord::new(c.block_no + 1, 0, 0)
        } else {
            c
        };
        self.set_coord(next);
    }

    pub fn move_up(&mut self, doc: &Document) {
        self.move_vertical(doc, false);
    }

    pub fn move_down(&mut self, doc: &Document) {
        self.move_vertical(doc, true);
    }

    /// Steps one visual line, crossing into neighbouring logical lines and
    /// blocks. At the top or bottom of the document the caret goes to the
    /// start or end of its line instead.
    fn move_vertical(&mut self, doc: &Document, down: bool) {
        let c = self.coord;
        let Ok(block) = doc.block_layout(c.block_no) else {
            return;
        };
        let Some(line) = block.line(c.line_no) else {
            return;
        };
        let visual = line.visual_index(c.offset);
        let x = match self.preferred_x {
            Some(x) => x,
            None => line.visual[visual].x_of(c.offset),
        };

        let target = if down {
            if visual + 1 < line.visual.len() {
                Some((c.block_no, c.line_no, visual + 1))
            } else if c.line_no + 1 < block.line_count() {
                Some((c.block_no, c.line_no + 1, 0))
            } else if c.block_no + 1 < doc.block_count() {
                Some((c.block_no + 1, 0, 0))
            } else {
                None
            }
        } else if visual > 0 {
            Some((c.block_no, c.line_no, visual - 1))
        } else if c.line_no > 0 {
            let above = &block.lines[c.line_no - 1];
            Some((c.block_no, c.line_no - 1, above.visual.len() - 1))
        } else if c.block_no > 0 {
            doc.block_layout(c.block_no - 1).ok().map(|above| {
                let last = above.line_count() - 1;
                (c.block_no - 1, last, above.lines[last].visual.len() - 1)
            })
        } else {
            None
        };

        match target {
            Some((block_no, line_no, visual)) => {
                let offset = doc
                    .block_layout(block_no)
                    .ok()
                    .and_then(|b| b.line(line_no))
                    .and_then(|l| l.visual.get(visual))
                    .map(|v| v.offset_at(x))
                    .unwrap_or(0);
                self.coord = CursorCoord::new(block_no, line_no, offset);
                self.preferred_x = Some(x);
            }
            None => {
                let offset = if down { line.len() } else { 0 };
                self.set_coord(CursorCoord { offset, ..c });
            }
        }
    }

    pub fn move_to_line_start(&mut self) {
        self.set_coord(CursorCoord {
            offset: 0,
            ..self.coord
        });
    }

    pub fn move_to_line_end(&mut self, doc: &Document) {
        let len = doc.line(self.coord).map(|l| l.len()).unwrap_or(0);
        self.set_coord(CursorCoord {
            offset: len,
            ..self.coord
        });
    }

    pub fn move_to_document_start(&mut self) {
        self.set_coord(CursorCoord::default());
    }

    pub fn move_to_document_end(&mut self, doc: &Document) {
        let last = doc.block_count().saturating_sub(1);
        if let Ok(end) = doc.block_end(last) {
            self.set_coord(end);
        }
    }

    /// Document-space caret position and caret height.
    pub fn position(&self, doc: &Document) -> Option<(Point, f32)> {
        let (point, height) = doc.line(self.coord).ok()?.point_at(self.coord.offset)?;
        let top = doc.block_top(self.coord.block_no);
        Some((Point::new(point.x, point.y + top), height))
    }

    /// Places the caret nearest to a document-space point. Points in the gap
    /// below a block belong to that block.
    pub fn set_position(&mut self, doc: &Document, point: Point) {
        let spacing = doc.settings().block_spacing;
        let count = doc.block_count();
        let mut top = 0.0;
        for (i, block) in doc.block_layouts().iter().enumerate() {
            let bottom = top + block.height + spacing;
            if point.y < bottom || i + 1 == count {
                let (line_no, offset) = block.locate(Point::new(point.x, point.y - top));
                self.set_coord(CursorCoord::new(i, line_no, offset));
                return;
            }
            top = bottom;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutSettings, MonospaceLayout};
    use crate::parsing::Parser;
    use rstest::rstest;

    fn at(doc: &Document, block_no: usize, line_no: usize, offset: usize) -> Cursor {
        let coord = CursorCoord::new(block_no, line_no, offset);
        doc.validate(coord).unwrap();
        Cursor::new(coord)
    }

    #[test]
    fn test_move_left_skips_surrogate_pair() {
        // Given "a😊b" with the caret after the emoji
        let doc = Document::from_text("a😊b");
        let mut cursor = at(&doc, 0, 0, 3);

        // When moving left
        cursor.move_left(&doc);

        // Then both units of the pair are crossed
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_move_right_skips_surrogate_pair() {
        let doc = Document::from_text("a😊b");
        let mut cursor = at(&doc, 0, 0, 1);

        cursor.move_right(&doc);

        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 3));
    }

    #[test]
    fn test_horizontal_moves_cross_lines_and_blocks() {
        let doc = Document::from_text("ab\ncd\n\nef");
        let mut cursor = at(&doc, 0, 1, 2);

        cursor.move_right(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(1, 0, 0));

        cursor.move_left(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 1, 2));

        cursor.move_to_line_start();
        cursor.move_left(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_document_edges_do_not_move() {
        let doc = Document::from_text("ab");
        let mut cursor = at(&doc, 0, 0, 0);

        cursor.move_left(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 0));

        cursor.move_to_document_end(&doc);
        cursor.move_right(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_vertical_motion_keeps_preferred_column() {
        // Given a long line, a short line, and a long line
        let doc = Document::from_text("abcdef\nx\nabcdef");
        let mut cursor = at(&doc, 0, 0, 5);

        // When moving down twice
        cursor.move_down(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 1, 1));
        cursor.move_down(&doc);

        // Then the original column is restored
        assert_eq!(cursor.coord(), CursorCoord::new(0, 2, 5));
    }

    #[test]
    fn test_vertical_motion_crosses_wrapped_lines() {
        let settings = LayoutSettings {
            max_width: 4.0,
            ..LayoutSettings::default()
        };
        let doc = Document::with_layout(
            "abcdefgh",
            Parser::default(),
            Box::new(MonospaceLayout::new(settings)),
        );
        let mut cursor = at(&doc, 0, 0, 1);

        cursor.move_down(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 5));

        cursor.move_up(&doc);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[rstest]
    #[case(true, CursorCoord::new(0, 0, 2))]
    #[case(false, CursorCoord::new(0, 0, 0))]
    fn test_vertical_motion_at_edges_goes_to_line_ends(
        #[case] down: bool,
        #[case] expected: CursorCoord,
    ) {
        let doc = Document::from_text("ab");
        let mut cursor = at(&doc, 0, 0, 1);

        if down {
            cursor.move_down(&doc);
        } else {
            cursor.move_up(&doc);
        }

        assert_eq!(cursor.coord(), expected);
    }

    #[test]
    fn test_move_up_into_previous_block() {
        let doc = Document::from_text("abc\n\nxy");
        let mut cursor = at(&doc, 1, 0, 2);

        cursor.move_up(&doc);

        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_position_round_trips_through_set_position() {
        let doc = Document::from_text("abc\n\nxyz");
        let cursor = at(&doc, 1, 0, 2);

        let (point, height) = cursor.position(&doc).unwrap();
        assert_eq!(point, Point::new(2.0, 2.0));
        assert_eq!(height, 1.0);

        let mut placed = Cursor::default();
        placed.set_position(&doc, point);
        assert_eq!(placed.coord(), cursor.coord());
    }

    #[test]
    fn test_set_position_in_block_gap_picks_block_above() {
        let doc = Document::from_text("abc\n\nxyz");
        let mut cursor = Cursor::default();

        cursor.set_position(&doc, Point::new(1.2, 1.5));

        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }
}
