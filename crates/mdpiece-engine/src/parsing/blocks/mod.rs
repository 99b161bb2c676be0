//! Block grammar.
//!
//! Each rule inspects the line at the cursor and, on success, builds its
//! node and reports how many lines it consumed. Rules only allocate nodes
//! once they know they match.

pub mod kinds;

use crate::tree::{NodeId, Tree};

use super::{
    grammar::Grammar,
    lines::{Line, LineView},
};
use kinds::{
    BlockQuote, BulletMarker, CheckboxMarker, CodeFence, Heading, LatexFence, OrderedMarker,
    Paragraph, PipeTable, ThematicBreak,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRule {
    Header,
    CodeBlock,
    CheckboxList,
    UnorderedList,
    OrderedList,
    QuoteBlock,
    Table,
    Hr,
    LatexBlock,
    Paragraph,
}

/// The split source a block rule reads from.
pub struct BlockCtx<'a> {
    pub units: &'a [u16],
    pub lines: &'a [Line],
    pub grammar: &'a Grammar,
}

impl<'a> BlockCtx<'a> {
    pub fn line(&self, i: usize) -> Option<LineView<'a>> {
        self.lines.get(i).map(|&line| LineView::new(self.units, line))
    }
}

/// A matched block and the number of lines it consumed.
#[derive(Debug, Clone, Copy)]
pub struct Parsed {
    pub node: NodeId,
    pub lines: usize,
}

impl BlockRule {
    pub fn parse(self, ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        match self {
            BlockRule::Header => Heading::parse(ctx, tree, at),
            BlockRule::CodeBlock => CodeFence::parse(ctx, tree, at),
            BlockRule::CheckboxList => CheckboxMarker::parse(ctx, tree, at),
            BlockRule::UnorderedList => BulletMarker::parse(ctx, tree, at),
            BlockRule::OrderedList => OrderedMarker::parse(ctx, tree, at),
            BlockRule::QuoteBlock => BlockQuote::parse(ctx, tree, at),
            BlockRule::Table if ctx.grammar.tables_enabled() => PipeTable::parse(ctx, tree, at),
            BlockRule::Table => None,
            BlockRule::Hr => ThematicBreak::parse(ctx, tree, at),
            BlockRule::LatexBlock => LatexFence::parse(ctx, tree, at),
            BlockRule::Paragraph => Paragraph::parse(ctx, tree, at),
        }
    }
}
