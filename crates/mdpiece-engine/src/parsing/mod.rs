//! # Markdown parser
//!
//! Builds a [`Tree`] whose text leaves reference the original buffer by
//! `(offset, length)` runs; nothing is copied out of the source.
//!
//! ## Modules
//!
//! - [`lines`]: line splitting over UTF-16 units
//! - [`tokens`]: inline tokenizer and text coalescing
//! - [`blocks`]: block rules (`kinds/` holds one file per construct)
//! - [`inline`]: inline rules
//! - [`grammar`]: the immutable rule tables
//! - [`snapshot`]: tree outlines and structural invariants for tests

pub mod blocks;
pub mod grammar;
pub mod inline;
pub mod lines;
pub mod snapshot;
pub mod tokens;

use log::trace;

use crate::tree::Tree;

pub use grammar::Grammar;

use blocks::BlockCtx;
use lines::split_lines;

/// Parser bound to a grammar. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    grammar: &'static Grammar,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Grammar::markdown())
    }
}

impl Parser {
    pub fn new(grammar: &'static Grammar) -> Self {
        Self { grammar }
    }

    /// Parses `text`. Runs in the result refer to the original buffer of
    /// [`crate::storage::Buffers::new`] called with the same text.
    pub fn parse(&self, text: &str) -> Tree {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.parse_units(&units)
    }

    pub fn parse_units(&self, units: &[u16]) -> Tree {
        let lines = split_lines(units);
        let ctx = BlockCtx {
            units,
            lines: &lines,
            grammar: self.grammar,
        };

        let mut tree = Tree::new();
        let root = tree.root();
        let mut at = 0;
        while at < lines.len() {
            let Some((rule, parsed)) = self
                .grammar
                .blocks()
                .iter()
                .find_map(|&rule| rule.parse(&ctx, &mut tree, at).map(|p| (rule, p)))
            else {
                break;
            };
            trace!("line {at}: {rule:?} consumed {} line(s)", parsed.lines);
            tree.append_child(root, parsed.node);
            at += parsed.lines.max(1);
        }
        tree
    }
}

/// Parses `text` with the editing grammar.
pub fn parse(text: &str) -> Tree {
    Parser::default().parse(text)
}
