use crate::{
    parsing::blocks::{BlockCtx, Parsed},
    tree::{Node, Tree},
};

pub struct LatexFence;

impl LatexFence {
    pub const DELIM: &'static str = "$$";

    /// `$$`, at least one content line, `$$`. Content lines become text
    /// children separated by [`Node::Lf`].
    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        if !ctx.line(at)?.starts_with(Self::DELIM) {
            return None;
        }
        let close = (at + 1..ctx.lines.len())
            .find(|&i| ctx.line(i).is_some_and(|l| l.starts_with(Self::DELIM)))?;
        if close == at + 1 {
            return None;
        }

        let block = tree.alloc(Node::LatexBlock);
        for (n, line) in (at + 1..close).filter_map(|i| ctx.line(i)).enumerate() {
            if n > 0 {
                let lf = tree.alloc(Node::Lf);
                tree.append_child(block, lf);
            }
            let text = tree.alloc_text(line.span());
            tree.append_child(block, text);
        }
        Some(Parsed {
            node: block,
            lines: close + 1 - at,
        })
    }
}
