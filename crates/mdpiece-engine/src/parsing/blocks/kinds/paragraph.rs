use crate::{
    parsing::{
        blocks::{BlockCtx, Parsed},
        grammar::PARAGRAPH_INLINE,
        inline::parse_line,
        lines::LineView,
    },
    tree::{Node, Tree},
};

pub struct Paragraph;

impl Paragraph {
    /// Prefixes that end a paragraph when a continuation line starts with them.
    pub const INTERRUPTS: [&'static str; 5] = ["#", "- ", "1. ", "```", "$$"];

    pub fn interrupted_by(line: LineView<'_>) -> bool {
        Self::INTERRUPTS.iter().any(|p| line.starts_with(p))
    }

    /// Fallback rule; matches any line.
    ///
    /// Lines are joined with [`Node::Lf`] until a blank line (consumed) or a
    /// line opening another block. A blank first line yields an empty
    /// paragraph.
    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        ctx.line(at)?;
        let paragraph = tree.alloc(Node::Paragraph);
        let mut i = at;
        while let Some(line) = ctx.line(i) {
            if line.is_empty() {
                i += 1;
                break;
            }
            if i > at {
                if Self::interrupted_by(line) {
                    break;
                }
                let lf = tree.alloc(Node::Lf);
                tree.append_child(paragraph, lf);
            }
            parse_line(tree, paragraph, line, PARAGRAPH_INLINE);
            i += 1;
        }
        Some(Parsed {
            node: paragraph,
            lines: i - at,
        })
    }
}
