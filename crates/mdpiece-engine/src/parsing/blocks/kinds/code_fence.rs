use crate::{
    parsing::blocks::{BlockCtx, Parsed},
    tree::{Node, Tree},
};

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";

    /// A fence line, its closing fence, and one text child per line between.
    /// An unclosed fence is not a code block.
    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        let open = ctx.line(at)?;
        if !open.starts_with(Self::BACKTICKS) {
            return None;
        }
        let close = (at + 1..ctx.lines.len())
            .find(|&i| ctx.line(i).is_some_and(|l| l.starts_with(Self::BACKTICKS)))?;

        let block = tree.alloc(Node::CodeBlock {
            name: open.mid(Self::BACKTICKS.len()).span(),
        });
        for line in (at + 1..close).filter_map(|i| ctx.line(i)) {
            let text = tree.alloc_text(line.span());
            tree.append_child(block, text);
        }
        Some(Parsed {
            node: block,
            lines: close + 1 - at,
        })
    }
}
