use crate::tree::NodeId;

use super::Point;

/// Inline formatting carried by a text cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikeout: bool,
    pub code: bool,
    pub link: bool,
    pub heading: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    Text(TextStyle),
    /// Inline latex source; editable text drawn by a latex renderer.
    Latex,
    /// Image placeholder; covers no text.
    Image { src: String },
    /// Horizontal rule; covers no text.
    Rule,
}

/// Background a painter draws behind a whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shade {
    #[default]
    None,
    Code,
    Quote,
    Latex,
}

/// A contiguous run of one node's text (or one object) on a visual line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub node: NodeId,
    /// Offset inside the node's text where the cell starts.
    pub node_offset: usize,
    /// Offset inside the logical line where the cell starts.
    pub line_offset: usize,
    /// Length in UTF-16 units. Zero for objects.
    pub len: usize,
    pub text: String,
    pub x: f32,
    pub width: f32,
    /// `x` of each unit boundary relative to the cell, `len + 1` entries.
    pub stops: Vec<f32>,
}

impl Cell {
    pub fn covers_text(&self) -> bool {
        matches!(self.kind, CellKind::Text(_) | CellKind::Latex)
    }

    fn contains(&self, offset: usize) -> bool {
        self.line_offset <= offset && offset <= self.line_offset + self.len
    }

    fn x_of(&self, offset: usize) -> f32 {
        let stop = self
            .stops
            .get(offset - self.line_offset)
            .copied()
            .unwrap_or(self.width);
        self.x + stop
    }
}

/// One wrapped display line.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    pub cells: Vec<Cell>,
    /// Top edge relative to the block.
    pub y: f32,
    pub height: f32,
    /// Left edge of content after any list marker.
    pub indent: f32,
    /// Right edge of content.
    pub width: f32,
    /// Logical-line offset of the first unit on this line.
    pub start: usize,
    /// List marker drawn left of the first visual line of an item.
    pub marker: Option<String>,
}

impl VisualLine {
    fn text_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.covers_text())
    }

    /// Logical-line offset just past the last unit on this line.
    pub fn end(&self) -> usize {
        self.text_cells()
            .map(|c| c.line_offset + c.len)
            .max()
            .unwrap_or(self.start)
    }

    /// Block-relative `x` of a caret at `offset`. A caret at the end of a
    /// line that closes with an image is drawn after the image.
    pub fn x_of(&self, offset: usize) -> f32 {
        if let Some(image) = self
            .cells
            .last()
            .filter(|c| matches!(c.kind, CellKind::Image { .. }) && c.line_offset == offset)
        {
            return image.x + image.width;
        }
        self.text_cells()
            .find(|c| c.contains(offset))
            .map(|c| c.x_of(offset))
            .unwrap_or(self.width)
    }

    /// Offset of the unit boundary nearest to `x`.
    pub fn offset_at(&self, x: f32) -> usize {
        let mut best = (self.start, f32::INFINITY);
        for cell in self.text_cells() {
            for (i, stop) in cell.stops.iter().enumerate() {
                let distance = (cell.x + stop - x).abs();
                if distance < best.1 {
                    best = (cell.line_offset + i, distance);
                }
            }
        }
        best.0
    }
}

/// Where a logical line's content lives: children `start..end` of `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAnchor {
    pub owner: NodeId,
    pub start: usize,
    pub end: usize,
}

/// One source line of a block: a paragraph line, a list item, a code line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub anchor: LineAnchor,
    /// Always at least one.
    pub visual: Vec<VisualLine>,
}

impl LogicalLine {
    /// Length in UTF-16 units.
    pub fn len(&self) -> usize {
        self.visual.iter().map(VisualLine::end).max().unwrap_or(0)
    }

    /// True when the line covers no text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn height(&self) -> f32 {
        self.visual.iter().map(|v| v.height).sum()
    }

    pub fn top(&self) -> f32 {
        self.visual.first().map(|v| v.y).unwrap_or(0.0)
    }

    /// Cells covering text, in order.
    pub fn text_cells(&self) -> impl Iterator<Item = &Cell> {
        self.visual.iter().flat_map(VisualLine::text_cells)
    }

    /// Resolves a line offset to `(text node, offset inside the node)`.
    ///
    /// At a boundary between two cells the left cell wins, so typing after
    /// styled text extends it.
    pub fn text_at(&self, offset: usize) -> Option<(NodeId, usize)> {
        self.text_cells()
            .find(|c| c.contains(offset))
            .map(|c| (c.node, c.node_offset + offset - c.line_offset))
    }

    /// The image closing the line when `offset` is the line end. The caret
    /// there sits after it.
    pub fn trailing_image(&self, offset: usize) -> Option<NodeId> {
        let last = self.visual.last()?.cells.last()?;
        (matches!(last.kind, CellKind::Image { .. }) && last.line_offset == offset)
            .then_some(last.node)
    }

    /// Index of the visual line showing `offset`. A wrap boundary belongs to
    /// the line it starts.
    pub fn visual_index(&self, offset: usize) -> usize {
        self.visual
            .iter()
            .rposition(|v| v.start <= offset)
            .unwrap_or(0)
    }

    /// Block-relative caret position and caret height for `offset`.
    pub fn point_at(&self, offset: usize) -> Option<(Point, f32)> {
        let visual = self.visual.get(self.visual_index(offset))?;
        Some((Point::new(visual.x_of(offset), visual.y), visual.height))
    }

    /// Nearest offset to a block-relative point.
    pub fn offset_at(&self, point: Point) -> usize {
        let visual = self
            .visual
            .iter()
            .find(|v| point.y < v.y + v.height)
            .or(self.visual.last());
        visual.map(|v| v.offset_at(point.x)).unwrap_or(0)
    }
}

/// Geometry of one top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Always at least one.
    pub lines: Vec<LogicalLine>,
    pub width: f32,
    pub height: f32,
    pub shade: Shade,
}

impl Block {
    pub fn line(&self, line_no: usize) -> Option<&LogicalLine> {
        self.lines.get(line_no)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Logical line under a block-relative `y`, clamped to the block.
    pub fn line_at_y(&self, y: f32) -> usize {
        self.lines
            .iter()
            .position(|l| y < l.top() + l.height())
            .unwrap_or(self.lines.len().saturating_sub(1))
    }

    /// `(line, offset)` nearest to a block-relative point.
    pub fn locate(&self, point: Point) -> (usize, usize) {
        let line_no = self.line_at_y(point.y);
        let offset = self
            .lines
            .get(line_no)
            .map(|l| l.offset_at(point))
            .unwrap_or(0);
        (line_no, offset)
    }
}
