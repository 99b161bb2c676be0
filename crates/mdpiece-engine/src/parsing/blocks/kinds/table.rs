use crate::{
    parsing::{
        blocks::{BlockCtx, Parsed},
        grammar::LIST_INLINE,
        inline::parse_line,
        lines::LineView,
    },
    tree::{Node, NodeId, Tree},
};

/// `| a | b |` tables. Only the read-only grammar enables this rule.
pub struct PipeTable;

impl PipeTable {
    pub const SEP: u8 = b'|';

    fn row(line: LineView<'_>) -> Option<LineView<'_>> {
        let line = line.trim();
        let closed = line.len() >= 2
            && line.get(0) == Some(u16::from(Self::SEP))
            && line.get(line.len() - 1) == Some(u16::from(Self::SEP));
        closed.then_some(line)
    }

    /// Cell contents between separators, trimmed.
    fn cells(row: LineView<'_>) -> Vec<LineView<'_>> {
        let seps: Vec<usize> = row
            .units()
            .iter()
            .enumerate()
            .filter(|&(_, &u)| u == u16::from(Self::SEP))
            .map(|(i, _)| i)
            .collect();
        seps.windows(2)
            .map(|w| row.mid(w[0] + 1).take(w[1] - w[0] - 1).trim())
            .collect()
    }

    fn is_delimiter_row(row: LineView<'_>) -> bool {
        row.units()
            .iter()
            .all(|&u| [b'|', b'-', b':', b' '].iter().any(|&b| u16::from(b) == u))
    }

    fn build_row(tree: &mut Tree, cells: Vec<LineView<'_>>, header: bool) -> NodeId {
        let row = tree.alloc(Node::TableRow { header });
        for content in cells {
            let cell = tree.alloc(Node::TableCell);
            parse_line(tree, cell, content, LIST_INLINE);
            tree.append_child(row, cell);
        }
        row
    }

    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        let header = Self::row(ctx.line(at)?)?;
        let columns = Self::cells(header).len();
        let delimiter = Self::row(ctx.line(at + 1)?)?;
        if !Self::is_delimiter_row(delimiter) || Self::cells(delimiter).len() != columns {
            return None;
        }

        let table = tree.alloc(Node::Table);
        let head = Self::build_row(tree, Self::cells(header), true);
        tree.append_child(table, head);

        let mut i = at + 2;
        while let Some(row) = ctx.line(i).and_then(Self::row) {
            let cells = Self::cells(row);
            if cells.len() != columns {
                break;
            }
            let row = Self::build_row(tree, cells, false);
            tree.append_child(table, row);
            i += 1;
        }
        Some(Parsed {
            node: table,
            lines: i - at,
        })
    }
}

/// `---`, `***` or `___` on a line of its own.
pub struct ThematicBreak;

impl ThematicBreak {
    pub const MARKS: [u8; 3] = [b'-', b'*', b'_'];

    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        let line = ctx.line(at)?.trim();
        let first = line.get(0)?;
        let is_rule = line.len() >= 3
            && Self::MARKS.iter().any(|&m| u16::from(m) == first)
            && line.units().iter().all(|&u| u == first);
        is_rule.then(|| Parsed {
            node: tree.alloc(Node::Hr),
            lines: 1,
        })
    }
}
