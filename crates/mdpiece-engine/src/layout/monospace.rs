use unicode_width::UnicodeWidthChar;

use crate::{
    storage::Buffers,
    tree::{Emphasis, Node, NodeId, Tree},
};

use super::{
    Layout, LayoutSettings,
    block::{Block, Cell, CellKind, LineAnchor, LogicalLine, Shade, TextStyle, VisualLine},
};

const TAB_COLUMNS: usize = 4;

/// Fixed-pitch layout: a character occupies its `unicode-width` column
/// count times `cell_width`, and lines wrap at `max_width` between
/// characters.
#[derive(Debug, Clone, Default)]
pub struct MonospaceLayout {
    settings: LayoutSettings,
}

impl MonospaceLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }
}

impl Layout for MonospaceLayout {
    fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    fn layout(&self, tree: &Tree, buffers: &Buffers, block: NodeId) -> Block {
        let s = &self.settings;
        let mut lines = Vec::new();
        let mut shade = Shade::None;

        match tree.node(block) {
            Node::Paragraph => {
                for (start, end) in lf_segments(tree, block) {
                    lines.push(self.inline_line(tree, buffers, block, start, end, TextStyle::default(), 0.0, None));
                }
            }
            Node::LatexBlock => {
                shade = Shade::Latex;
                for (start, end) in lf_segments(tree, block) {
                    lines.push(self.inline_line(tree, buffers, block, start, end, TextStyle::default(), 0.0, None));
                }
            }
            Node::Header { level } => {
                let style = TextStyle {
                    heading: Some(*level),
                    bold: true,
                    ..TextStyle::default()
                };
                let end = tree.children(block).len();
                lines.push(self.inline_line(tree, buffers, block, 0, end, style, 0.0, None));
            }
            Node::UnorderedList | Node::OrderedList | Node::CheckboxList => {
                for (i, &item) in tree.children(block).iter().enumerate() {
                    let marker = match tree.node(item) {
                        Node::OrderedItem => format!("{}. ", i + 1),
                        Node::CheckboxItem { checked: true } => "[x] ".to_string(),
                        Node::CheckboxItem { checked: false } => "[ ] ".to_string(),
                        _ => "• ".to_string(),
                    };
                    let indent = columns(&marker) as f32 * s.cell_width;
                    let end = tree.children(item).len();
                    lines.push(self.inline_line(tree, buffers, item, 0, end, TextStyle::default(), indent, Some(marker)));
                }
            }
            Node::CodeBlock { .. } | Node::QuoteBlock => {
                let (style, indent, kind_shade) = match tree.node(block) {
                    Node::CodeBlock { .. } => (
                        TextStyle {
                            code: true,
                            ..TextStyle::default()
                        },
                        0.0,
                        Shade::Code,
                    ),
                    _ => (TextStyle::default(), 2.0 * s.cell_width, Shade::Quote),
                };
                shade = kind_shade;
                for i in 0..tree.children(block).len() {
                    lines.push(self.inline_line(tree, buffers, block, i, i + 1, style, indent, None));
                }
            }
            Node::Table => {
                for &row in tree.children(block) {
                    let style = TextStyle {
                        bold: matches!(tree.node(row), Node::TableRow { header: true }),
                        ..TextStyle::default()
                    };
                    let mut line = LineBuilder::new(s, 0.0, None);
                    for (i, &cell) in tree.children(row).iter().enumerate() {
                        if i > 0 {
                            line.advance(columns(" | ") as f32 * s.cell_width);
                        }
                        for &child in tree.children(cell) {
                            line.push_inline(tree, buffers, child, style);
                        }
                    }
                    let end = tree.children(row).len();
                    lines.push(line.finish(LineAnchor { owner: row, start: 0, end }));
                }
            }
            Node::Hr => {
                let mut line = LineBuilder::new(s, 0.0, None);
                line.push_object(block, CellKind::Rule, s.max_width, s.line_height);
                lines.push(line.finish(LineAnchor {
                    owner: block,
                    start: 0,
                    end: 0,
                }));
            }
            _ => {}
        }

        if lines.is_empty() {
            let style = match tree.node(block) {
                Node::CodeBlock { .. } => TextStyle {
                    code: true,
                    ..TextStyle::default()
                },
                _ => TextStyle::default(),
            };
            lines.push(self.inline_line(tree, buffers, block, 0, 0, style, 0.0, None));
        }

        stack_lines(&mut lines);
        Block {
            width: lines
                .iter()
                .flat_map(|l| &l.visual)
                .map(|v| v.width)
                .fold(0.0, f32::max),
            height: lines.iter().map(LogicalLine::height).sum(),
            lines,
            shade,
        }
    }
}

impl MonospaceLayout {
    #[allow(clippy::too_many_arguments)]
    fn inline_line(
        &self,
        tree: &Tree,
        buffers: &Buffers,
        owner: NodeId,
        start: usize,
        end: usize,
        style: TextStyle,
        indent: f32,
        marker: Option<String>,
    ) -> LogicalLine {
        let mut line = LineBuilder::new(&self.settings, indent, marker);
        for &child in &tree.children(owner)[start..end] {
            line.push_inline(tree, buffers, child, style);
        }
        line.finish(LineAnchor { owner, start, end })
    }
}

/// Child index ranges of `block` between [`Node::Lf`] separators.
fn lf_segments(tree: &Tree, block: NodeId) -> Vec<(usize, usize)> {
    let children = tree.children(block);
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, &child) in children.iter().enumerate() {
        if matches!(tree.node(child), Node::Lf) {
            segments.push((start, i));
            start = i + 1;
        }
    }
    segments.push((start, children.len()));
    segments
}

/// Assigns block-relative `y` to every visual line.
fn stack_lines(lines: &mut [LogicalLine]) {
    let mut y = 0.0;
    for visual in lines.iter_mut().flat_map(|l| l.visual.iter_mut()) {
        visual.y = y;
        y += visual.height;
    }
}

fn columns(s: &str) -> usize {
    s.chars().map(char_columns).sum()
}

fn char_columns(c: char) -> usize {
    match c {
        '\t' => TAB_COLUMNS,
        c => c.width().unwrap_or(0),
    }
}

/// Accumulates cells for one logical line, wrapping as it goes.
struct LineBuilder<'s> {
    settings: &'s LayoutSettings,
    indent: f32,
    marker: Option<String>,
    done: Vec<VisualLine>,
    cells: Vec<Cell>,
    x: f32,
    height: f32,
    /// Offset in the logical line of the next unit.
    offset: usize,
    visual_start: usize,
}

impl<'s> LineBuilder<'s> {
    fn new(settings: &'s LayoutSettings, indent: f32, marker: Option<String>) -> Self {
        Self {
            settings,
            indent,
            marker,
            done: Vec::new(),
            cells: Vec::new(),
            x: indent,
            height: settings.line_height,
            offset: 0,
            visual_start: 0,
        }
    }

    fn fits(&self, width: f32) -> bool {
        self.x + width <= self.settings.max_width || self.x <= self.indent
    }

    fn wrap(&mut self) {
        let visual = VisualLine {
            cells: std::mem::take(&mut self.cells),
            y: 0.0,
            height: self.height,
            indent: self.indent,
            width: self.x,
            start: self.visual_start,
            marker: if self.done.is_empty() {
                self.marker.take()
            } else {
                None
            },
        };
        self.done.push(visual);
        self.x = self.indent;
        self.height = self.settings.line_height;
        self.visual_start = self.offset;
    }

    fn advance(&mut self, width: f32) {
        if !self.fits(width) {
            self.wrap();
        }
        self.x += width;
    }

    fn push_inline(&mut self, tree: &Tree, buffers: &Buffers, id: NodeId, style: TextStyle) {
        match tree.node(id) {
            Node::Text(span) => {
                let units = span.units(buffers);
                self.push_text(id, &units, CellKind::Text(style));
            }
            Node::Image { src, .. } => {
                let kind = CellKind::Image {
                    src: src.materialize(buffers),
                };
                self.push_object(id, kind, self.settings.image_width, self.settings.image_height);
            }
            Node::InlineLatex => {
                for &child in tree.children(id) {
                    if let Some(span) = tree.text(child) {
                        let units = span.units(buffers);
                        self.push_text(child, &units, CellKind::Latex);
                    }
                }
            }
            node => {
                let style = match node {
                    Node::Emphasis(Emphasis::Italic) => TextStyle { italic: true, ..style },
                    Node::Emphasis(Emphasis::Bold) => TextStyle { bold: true, ..style },
                    Node::Emphasis(Emphasis::ItalicBold) => TextStyle {
                        bold: true,
                        italic: true,
                        ..style
                    },
                    Node::Emphasis(Emphasis::Strikeout) => TextStyle {
                        strikeout: true,
                        ..style
                    },
                    Node::Link { .. } => TextStyle { link: true, ..style },
                    Node::InlineCode => TextStyle { code: true, ..style },
                    _ => style,
                };
                for &child in tree.children(id) {
                    self.push_inline(tree, buffers, child, style);
                }
            }
        }
    }

    fn open_cell(&self, node: NodeId, node_offset: usize, kind: CellKind) -> Cell {
        Cell {
            kind,
            node,
            node_offset,
            line_offset: self.offset,
            len: 0,
            text: String::new(),
            x: self.x,
            width: 0.0,
            stops: vec![0.0],
        }
    }

    fn close_cell(&mut self, cell: Cell) {
        if cell.len > 0 {
            self.cells.push(cell);
        }
    }

    fn push_text(&mut self, node: NodeId, units: &[u16], kind: CellKind) {
        let mut cell = self.open_cell(node, 0, kind.clone());
        let mut node_offset = 0;
        for decoded in char::decode_utf16(units.iter().copied()) {
            let c = decoded.unwrap_or(char::REPLACEMENT_CHARACTER);
            let unit_len = c.len_utf16();
            let width = char_columns(c) as f32 * self.settings.cell_width;

            if !self.fits(width) {
                self.close_cell(cell);
                self.wrap();
                cell = self.open_cell(node, node_offset, kind.clone());
            }
            if unit_len == 2 {
                cell.stops.push(self.x - cell.x);
            }
            self.x += width;
            cell.stops.push(self.x - cell.x);
            cell.width = self.x - cell.x;
            cell.len += unit_len;
            cell.text.push(c);
            self.offset += unit_len;
            node_offset += unit_len;
        }
        self.close_cell(cell);
    }

    fn push_object(&mut self, node: NodeId, kind: CellKind, width: f32, height: f32) {
        if !self.fits(width) {
            self.wrap();
        }
        let mut cell = self.open_cell(node, 0, kind);
        cell.width = width;
        self.x += width;
        self.height = self.height.max(height);
        self.cells.push(cell);
    }

    fn finish(mut self, anchor: LineAnchor) -> LogicalLine {
        self.wrap();
        LogicalLine {
            anchor,
            visual: self.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::Point, parsing::parse};
    use pretty_assertions::assert_eq;

    fn layout_all(text: &str, max_width: f32) -> (Tree, Vec<Block>) {
        let tree = parse(text);
        let buffers = Buffers::new(text);
        let layout = MonospaceLayout::new(LayoutSettings {
            max_width,
            ..LayoutSettings::default()
        });
        let blocks = tree
            .blocks()
            .iter()
            .map(|&b| layout.layout(&tree, &buffers, b))
            .collect();
        (tree, blocks)
    }

    #[test]
    fn test_paragraph_lf_starts_logical_line() {
        let (_, blocks) = layout_all("ab\ncde", 80.0);
        let lines = &blocks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[1].len(), 3);
        assert_eq!(lines[1].anchor.start, 2);
        assert_eq!(blocks[0].height, 2.0);
    }

    #[test]
    fn test_wrapping_splits_cells_across_visual_lines() {
        let (tree, blocks) = layout_all("abcdef", 4.0);
        let line = &blocks[0].lines[0];
        assert_eq!(line.visual.len(), 2);
        assert_eq!(line.visual[1].start, 4);
        assert_eq!(line.len(), 6);

        let text = tree.children(tree.blocks()[0])[0];
        assert_eq!(line.text_at(5), Some((text, 5)));
        assert_eq!(line.point_at(4), Some((Point::new(0.0, 1.0), 1.0)));
    }

    #[test]
    fn test_surrogate_pair_has_no_inner_stop() {
        let (_, blocks) = layout_all("a😊b", 80.0);
        let line = &blocks[0].lines[0];
        assert_eq!(line.len(), 4);
        let (p1, _) = line.point_at(1).unwrap();
        let (p2, _) = line.point_at(2).unwrap();
        let (p3, _) = line.point_at(3).unwrap();
        assert_eq!(p1.x, 1.0);
        assert_eq!(p2.x, 1.0);
        assert_eq!(p3.x, 3.0);
    }

    #[test]
    fn test_text_at_prefers_left_cell_at_boundary() {
        let (tree, blocks) = layout_all("a**b**c", 80.0);
        let para = tree.blocks()[0];
        let first = tree.children(para)[0];
        let line = &blocks[0].lines[0];
        assert_eq!(line.len(), 3);
        assert_eq!(line.text_at(1), Some((first, 1)));
    }

    #[test]
    fn test_caret_at_line_end_sits_after_trailing_image() {
        let (_, blocks) = layout_all("a![x](y)", 80.0);
        let line = &blocks[0].lines[0];
        let image_width = LayoutSettings::default().image_width;

        assert_eq!(line.len(), 1);
        assert_eq!(line.point_at(0).unwrap().0.x, 0.0);
        assert_eq!(line.point_at(1).unwrap().0.x, 1.0 + image_width);
    }

    #[test]
    fn test_list_items_are_logical_lines_with_markers() {
        let (tree, blocks) = layout_all("1. a\n2. bc", 80.0);
        let block = &blocks[0];
        assert_eq!(block.line_count(), 2);
        assert_eq!(block.lines[0].visual[0].marker.as_deref(), Some("1. "));
        assert_eq!(block.lines[1].visual[0].marker.as_deref(), Some("2. "));
        assert_eq!(block.lines[1].anchor.owner, tree.children(tree.blocks()[0])[1]);
        assert_eq!(block.lines[0].point_at(0).unwrap().0.x, 3.0);
    }

    #[test]
    fn test_empty_code_line_is_empty_logical_line() {
        let (_, blocks) = layout_all("```\na\n\n```", 80.0);
        let block = &blocks[0];
        assert_eq!(block.shade, Shade::Code);
        assert_eq!(block.line_count(), 2);
        assert!(block.lines[1].is_empty());
        assert_eq!(block.lines[1].anchor.start, 1);
    }

    #[test]
    fn test_empty_paragraph_has_one_empty_line() {
        let (_, blocks) = layout_all("\nx", 80.0);
        assert_eq!(blocks[0].line_count(), 1);
        assert!(blocks[0].lines[0].is_empty());
        assert_eq!(blocks[0].lines[0].visual.len(), 1);
    }

    #[test]
    fn test_locate_maps_point_back_to_offset() {
        let (_, blocks) = layout_all("one\ntwo", 80.0);
        assert_eq!(blocks[0].locate(Point::new(2.2, 1.5)), (1, 2));
        assert_eq!(blocks[0].locate(Point::new(99.0, 99.0)), (1, 3));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let (_, a) = layout_all("# t\n- x\n> q", 10.0);
        let (_, b) = layout_all("# t\n- x\n> q", 10.0);
        assert_eq!(a, b);
    }
}
