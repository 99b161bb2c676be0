use crate::{
    storage::{Buffers, Source},
    tree::{Node, NodeId, Tree},
};

/// Asserts the structural invariants every reachable node must satisfy:
///
/// - each child's parent link points back at its parent
/// - text runs are non-empty and lie inside their buffer
/// - every text leaf belongs to a top-level block
/// - inline wrappers hold exactly one child
///
/// Panics on the first violation.
pub fn invariants(tree: &Tree, buffers: &Buffers) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        for &child in tree.children(id) {
            assert_eq!(
                tree.parent(child),
                Some(id),
                "child {child:?} of {id:?} has a wrong parent link"
            );
            stack.push(child);
        }
        check_node(tree, buffers, id);
    }
}

fn check_node(tree: &Tree, buffers: &Buffers, id: NodeId) {
    match tree.node(id) {
        Node::Text(span) => {
            for run in span.runs() {
                assert!(run.length > 0, "zero-length run in {id:?}");
                let limit = match run.source {
                    Source::Original => buffers.original().len(),
                    Source::Added => buffers.added().len(),
                };
                assert!(run.end() <= limit, "run {run:?} in {id:?} overruns its buffer");
            }
            assert!(tree.block_of(id).is_some(), "text {id:?} is not inside a block");
        }
        node if node.is_inline_wrapper() => {
            assert_eq!(
                tree.children(id).len(),
                1,
                "{} wrapper {id:?} must hold one child",
                node.label()
            );
        }
        _ => {}
    }
}
