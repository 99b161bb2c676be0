//! Markdown text for a document tree.
//!
//! Output reparses to the same block structure for everything the editing
//! grammar produces. Blocks that swallow a following blank line when parsed
//! (non-empty paragraphs, quotes) are written with one after them; an empty
//! paragraph is written as the blank line it was parsed from.

use crate::{
    parsing::blocks::kinds::{BlockQuote, BulletMarker, CheckboxMarker, CodeFence, LatexFence},
    storage::Buffers,
    tree::{Node, NodeId, Tree},
};

pub fn to_markdown(tree: &Tree, buffers: &Buffers) -> String {
    let mut out = String::new();
    let blocks = tree.blocks();
    for (i, &block) in blocks.iter().enumerate() {
        write_block(tree, buffers, block, &mut out);
        if i + 1 < blocks.len() && swallows_blank(tree, block) {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn swallows_blank(tree: &Tree, block: NodeId) -> bool {
    match tree.node(block) {
        Node::Paragraph => !tree.children(block).is_empty(),
        Node::QuoteBlock => true,
        _ => false,
    }
}

fn write_block(tree: &Tree, buffers: &Buffers, block: NodeId, out: &mut String) {
    let children = tree.children(block);
    match tree.node(block) {
        Node::Header { level } => {
            out.push_str(&"#".repeat(usize::from(*level)));
            out.push(' ');
            write_inlines(tree, buffers, children, out);
        }
        Node::Paragraph => write_inlines(tree, buffers, children, out),
        Node::UnorderedList | Node::OrderedList | Node::CheckboxList => {
            for (i, &item) in children.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                match tree.node(item) {
                    Node::OrderedItem => out.push_str(&format!("{}. ", i + 1)),
                    Node::CheckboxItem { checked } => {
                        out.push_str(BulletMarker::PREFIX);
                        out.push_str(if *checked {
                            CheckboxMarker::CHECKED
                        } else {
                            CheckboxMarker::UNCHECKED
                        });
                        out.push(' ');
                    }
                    _ => out.push_str(BulletMarker::PREFIX),
                }
                write_inlines(tree, buffers, tree.children(item), out);
            }
        }
        Node::CodeBlock { name } => {
            out.push_str(CodeFence::BACKTICKS);
            out.push_str(&name.materialize(buffers));
            out.push('\n');
            for &line in children {
                write_inline(tree, buffers, line, out);
                out.push('\n');
            }
            out.push_str(CodeFence::BACKTICKS);
        }
        Node::QuoteBlock => {
            for (i, &line) in children.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(BlockQuote::PREFIX);
                write_inline(tree, buffers, line, out);
            }
        }
        Node::LatexBlock => {
            out.push_str(LatexFence::DELIM);
            out.push('\n');
            write_inlines(tree, buffers, children, out);
            out.push('\n');
            out.push_str(LatexFence::DELIM);
        }
        Node::Table => {
            for (i, &row) in children.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let cells = tree.children(row);
                out.push('|');
                for &cell in cells {
                    out.push(' ');
                    write_inlines(tree, buffers, tree.children(cell), out);
                    out.push_str(" |");
                }
                if matches!(tree.node(row), Node::TableRow { header: true }) {
                    out.push_str("\n|");
                    out.push_str(&"---|".repeat(cells.len()));
                }
            }
        }
        Node::Hr => out.push_str("---"),
        _ => write_inline(tree, buffers, block, out),
    }
}

fn write_inlines(tree: &Tree, buffers: &Buffers, nodes: &[NodeId], out: &mut String) {
    for &node in nodes {
        write_inline(tree, buffers, node, out);
    }
}

fn write_inline(tree: &Tree, buffers: &Buffers, node: NodeId, out: &mut String) {
    let children = tree.children(node);
    match tree.node(node) {
        Node::Text(span) => out.push_str(&span.materialize(buffers)),
        Node::Lf => out.push('\n'),
        Node::Emphasis(emphasis) => {
            let delimiter = emphasis.delimiter();
            out.push_str(delimiter);
            write_inlines(tree, buffers, children, out);
            out.push_str(delimiter);
        }
        Node::Link { href } => {
            out.push('[');
            write_inlines(tree, buffers, children, out);
            out.push_str("](");
            out.push_str(&href.materialize(buffers));
            out.push(')');
        }
        Node::Image { alt, src } => {
            out.push_str("![");
            out.push_str(&alt.materialize(buffers));
            out.push_str("](");
            out.push_str(&src.materialize(buffers));
            out.push(')');
        }
        Node::InlineCode => {
            out.push('`');
            write_inlines(tree, buffers, children, out);
            out.push('`');
        }
        Node::InlineLatex => {
            out.push('$');
            write_inlines(tree, buffers, children, out);
            out.push('$');
        }
        _ => write_inlines(tree, buffers, children, out),
    }
}
