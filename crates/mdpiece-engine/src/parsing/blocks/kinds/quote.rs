use crate::{
    parsing::blocks::{BlockCtx, Parsed},
    tree::{Node, Tree},
};

pub struct BlockQuote;

impl BlockQuote {
    pub const PREFIX: &'static str = "> ";

    /// Consecutive `> ` lines, one text child each. A blank line directly
    /// after the quote belongs to it.
    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        if !ctx.line(at)?.starts_with(Self::PREFIX) {
            return None;
        }

        let block = tree.alloc(Node::QuoteBlock);
        let mut i = at;
        while let Some(line) = ctx.line(i).filter(|l| l.starts_with(Self::PREFIX)) {
            let text = tree.alloc_text(line.mid(Self::PREFIX.len()).span());
            tree.append_child(block, text);
            i += 1;
        }
        if ctx.line(i).is_some_and(|l| l.is_empty()) {
            i += 1;
        }
        Some(Parsed {
            node: block,
            lines: i - at,
        })
    }
}
