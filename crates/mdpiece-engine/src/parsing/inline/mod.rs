//! Inline grammar.
//!
//! A line is tokenized, then each position is offered to the block's inline
//! rules in priority order. Tokens no rule claims are coalesced into plain
//! text nodes.

mod rules;

pub use rules::{InlineMatch, InlineRule};

use crate::tree::{NodeId, Tree};

use super::{
    lines::LineView,
    tokens::{Token, merge_to_spans, tokenize},
};

/// Parses `line` and appends the resulting inline nodes to `parent`.
pub fn parse_line(tree: &mut Tree, parent: NodeId, line: LineView<'_>, rules: &[InlineRule]) {
    let tokens = tokenize(line);
    let mut i = 0;
    let mut text_start = 0;

    while i < tokens.len() {
        match rules.iter().find_map(|rule| rule.try_match(&tokens, i)) {
            Some((matched, consumed)) => {
                flush_text(tree, parent, &tokens[text_start..i]);
                let node = matched.build(tree);
                tree.append_child(parent, node);
                i += consumed;
                text_start = i;
            }
            None => i += 1,
        }
    }

    flush_text(tree, parent, &tokens[text_start..]);
}

fn flush_text(tree: &mut Tree, parent: NodeId, tokens: &[Token]) {
    for span in merge_to_spans(tokens) {
        let text = tree.alloc_text(span);
        tree.append_child(parent, text);
    }
}
