//! Tree rewrites shared by the edit commands. Everything here works on
//! detached child lists or on a single owner; relayout is the caller's job.

use crate::{
    layout::LogicalLine,
    storage::{Buffers, TextSpan},
    tree::{Node, NodeId, Tree},
};

use super::EditError;

/// Where a split lands inside an inline owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Seam {
    /// Inside (or at either end of) a text node.
    Text { node: NodeId, offset: usize },
    /// Between two children of the owner.
    Index(usize),
}

pub(crate) fn seam_at(line: &LogicalLine, offset: usize) -> Seam {
    if line.trailing_image(offset).is_some() {
        return Seam::Index(line.anchor.end);
    }
    match line.text_at(offset) {
        Some((node, offset)) => Seam::Text { node, offset },
        None => Seam::Index(line.anchor.end),
    }
}

/// Detaches every child of `owner` and partitions them at `seam`.
///
/// A text cut in half becomes two nodes. When the text sits in a wrapper the
/// wrapper is cloned around the right half. Halves left empty are freed.
pub(crate) fn split_children(
    tree: &mut Tree,
    owner: NodeId,
    seam: Seam,
) -> Result<(Vec<NodeId>, Vec<NodeId>), EditError> {
    let (text, offset) = match seam {
        Seam::Index(at) => {
            let mut left = tree.take_children(owner);
            let right = left.split_off(at.min(left.len()));
            return Ok((left, right));
        }
        Seam::Text { node, offset } => (node, offset),
    };

    let top = match tree.parent(text) {
        Some(parent) if parent == owner => text,
        Some(parent) => parent,
        None => return Err(EditError::NotText(text)),
    };
    let at = tree.index_in_parent(top).ok_or(EditError::NotText(text))?;
    let (left_span, right_span) = tree.text(text).ok_or(EditError::NotText(text))?.split(offset)?;

    let mut left = tree.take_children(owner);
    let mut right = left.split_off(at + 1);

    let right_text = tree.alloc_text(right_span);
    let right_top = if top == text {
        right_text
    } else {
        let wrapper = tree.node(top).clone();
        tree.alloc_with(wrapper, [right_text])
    };
    if let Some(span) = tree.text_mut(text) {
        *span = left_span;
    }
    right.insert(0, right_top);

    drop_empty(tree, &mut left);
    drop_empty(tree, &mut right);
    Ok((left, right))
}

fn is_empty_inline(tree: &Tree, id: NodeId) -> bool {
    match tree.node(id) {
        Node::Text(span) => span.is_empty(),
        node if node.is_inline_wrapper() => tree
            .children(id)
            .iter()
            .all(|&c| tree.text(c).is_some_and(TextSpan::is_empty)),
        _ => false,
    }
}

fn drop_empty(tree: &mut Tree, nodes: &mut Vec<NodeId>) {
    nodes.retain(|&n| {
        let empty = is_empty_inline(tree, n);
        if empty {
            tree.free(n);
        }
        !empty
    });
}

/// Frees a trailing [`Node::Lf`] of `left` and a leading one of `right`.
/// Returns whether anything was dropped.
pub(crate) fn trim_line_feeds(
    tree: &mut Tree,
    left: &mut Vec<NodeId>,
    right: &mut Vec<NodeId>,
) -> bool {
    let mut trimmed = false;
    if left.last().is_some_and(|&n| matches!(tree.node(n), Node::Lf)) {
        if let Some(lf) = left.pop() {
            tree.free(lf);
            trimmed = true;
        }
    }
    if right.first().is_some_and(|&n| matches!(tree.node(n), Node::Lf)) {
        let lf = right.remove(0);
        tree.free(lf);
        trimmed = true;
    }
    trimmed
}

/// Joins child `index` of `owner` into child `index - 1` when both are text.
pub(crate) fn join_texts_at(tree: &mut Tree, owner: NodeId, index: usize) {
    let children = tree.children(owner);
    let (Some(&left), Some(&right)) = (
        index.checked_sub(1).and_then(|i| children.get(i)),
        children.get(index),
    ) else {
        return;
    };
    let Some(span) = tree.text(right).cloned() else {
        return;
    };
    if let Some(target) = tree.text_mut(left) {
        target.append(span);
        tree.free(right);
    }
}

/// Appends inline `nodes` to `owner`, folding a text into a text that
/// already ends the owner.
pub(crate) fn append_inline(tree: &mut Tree, owner: NodeId, nodes: Vec<NodeId>) {
    for node in nodes {
        let last = tree.children(owner).last().copied();
        let span = tree.text(node).cloned();
        match (last, span) {
            (Some(last), Some(span)) if tree.text(last).is_some() => {
                if let Some(target) = tree.text_mut(last) {
                    target.append(span);
                }
                tree.free(node);
            }
            _ => tree.append_child(owner, node),
        }
    }
}

/// Detaches a block's content as one inline sequence. List items and
/// line-per-text blocks are joined with [`Node::Lf`]; empty line texts are
/// dropped. Leaves `block` childless.
pub(crate) fn flatten_block(tree: &mut Tree, block: NodeId) -> Vec<NodeId> {
    let node = tree.node(block).clone();
    let children = tree.take_children(block);
    if !(node.is_list() || matches!(node, Node::CodeBlock { .. } | Node::QuoteBlock)) {
        return children;
    }

    let mut out = Vec::new();
    for (i, child) in children.into_iter().enumerate() {
        if i > 0 {
            out.push(tree.alloc(Node::Lf));
        }
        if node.is_list() {
            out.extend(tree.take_children(child));
            tree.free(child);
        } else if tree.text(child).is_some_and(TextSpan::is_empty) {
            tree.free(child);
        } else {
            out.push(child);
        }
    }
    out
}

/// Concatenated text of `nodes` and their text leaves.
pub(crate) fn concat_text(tree: &Tree, nodes: &[NodeId]) -> TextSpan {
    let mut span = TextSpan::new();
    for &node in nodes {
        for leaf in tree.text_leaves(node) {
            if let Some(text) = tree.text(leaf) {
                span.append(text.clone());
            }
        }
    }
    span
}

/// True when `nodes` are all plain text starting with `prefix`.
pub(crate) fn starts_with(tree: &Tree, buffers: &Buffers, nodes: &[NodeId], prefix: &str) -> bool {
    if nodes.is_empty() || !nodes.iter().all(|&n| tree.text(n).is_some()) {
        return false;
    }
    let units = concat_text(tree, nodes).units(buffers);
    let prefix: Vec<u16> = prefix.encode_utf16().collect();
    units.starts_with(&prefix)
}

/// What [`prune_emptied`] freed: the slot under `parent` and the wrappers
/// that held the text, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pruned {
    pub parent: NodeId,
    pub index: usize,
    pub wrappers: Vec<Node>,
}

/// Frees a text emptied by a removal. Wrappers left with nothing in them
/// go too; line texts of code and quote blocks stay.
pub(crate) fn prune_emptied(tree: &mut Tree, text: NodeId) -> Option<Pruned> {
    if !tree.text(text).is_some_and(TextSpan::is_empty) {
        return None;
    }
    if matches!(
        tree.node(tree.parent(text)?),
        Node::CodeBlock { .. } | Node::QuoteBlock
    ) {
        return None;
    }
    let mut doomed = text;
    let mut wrappers = Vec::new();
    while let Some(parent) = tree.parent(doomed).filter(|&p| tree.node(p).is_inline_wrapper()) {
        wrappers.insert(0, tree.node(parent).clone());
        doomed = parent;
    }
    let pruned = tree
        .parent(doomed)
        .zip(tree.index_in_parent(doomed))
        .map(|(parent, index)| Pruned {
            parent,
            index,
            wrappers,
        });
    tree.free(doomed);
    pruned
}

/// Removes the first `n` units of `owner`'s leading text. Returns `false`
/// without touching the tree when that text is missing or too short.
pub(crate) fn strip_leading(tree: &mut Tree, owner: NodeId, n: usize) -> Result<bool, EditError> {
    let Some(&first) = tree.children(owner).first() else {
        return Ok(n == 0);
    };
    let Some(span) = tree.text_mut(first) else {
        return Ok(false);
    };
    if span.len() < n {
        return Ok(false);
    }
    span.remove(0, n)?;
    let emptied = span.is_empty();
    if emptied {
        tree.free(first);
    }
    Ok(true)
}

/// Puts `span` in front of `owner`'s content.
pub(crate) fn prepend_text(tree: &mut Tree, owner: NodeId, span: TextSpan) -> Result<(), EditError> {
    let first = tree.children(owner).first().copied();
    if let Some(text) = first.and_then(|f| tree.text_mut(f)) {
        let mut joined = span;
        joined.append(text.clone());
        *text = joined;
        return Ok(());
    }
    let text = tree.alloc_text(span);
    tree.insert_child(owner, 0, text);
    Ok(())
}
