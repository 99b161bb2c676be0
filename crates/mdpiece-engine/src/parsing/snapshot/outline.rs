use std::fmt::Write;

use crate::{
    storage::Buffers,
    tree::{Node, NodeId, Tree},
};

/// Renders the tree below the root as an indented outline, one node per
/// line, with text materialized.
pub fn outline(tree: &Tree, buffers: &Buffers) -> String {
    let mut out = String::new();
    for &block in tree.blocks() {
        write_node(tree, buffers, block, 0, &mut out);
    }
    out
}

fn write_node(tree: &Tree, buffers: &Buffers, id: NodeId, depth: usize, out: &mut String) {
    let node = tree.node(id);
    let _ = write!(out, "{:indent$}{}", "", node.label(), indent = depth * 2);
    match node {
        Node::Text(span) => {
            let _ = write!(out, " {:?}", span.materialize(buffers));
        }
        Node::CodeBlock { name } => {
            let _ = write!(out, " {:?}", name.materialize(buffers));
        }
        Node::Link { href } => {
            let _ = write!(out, " {:?}", href.materialize(buffers));
        }
        Node::Image { alt, src } => {
            let _ = write!(
                out,
                " {:?} {:?}",
                alt.materialize(buffers),
                src.materialize(buffers)
            );
        }
        _ => {}
    }
    out.push('\n');
    for &child in tree.children(id) {
        write_node(tree, buffers, child, depth + 1, out);
    }
}
