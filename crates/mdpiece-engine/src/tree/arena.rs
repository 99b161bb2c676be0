use super::node::Node;
use crate::storage::TextSpan;

/// Handle to a node slot in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of nodes with a free list.
///
/// Freed slots are recycled by later allocations, so a handle must not be
/// used after the node it named was freed.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only an empty root container.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.alloc(Node::Container);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Top-level blocks in document order.
    pub fn blocks(&self) -> &[NodeId] {
        self.children(self.root)
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let slot = Slot {
            node,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(slot));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub fn alloc_text(&mut self, span: TextSpan) -> NodeId {
        self.alloc(Node::Text(span))
    }

    /// Allocates `node` and adopts `children` in order.
    pub fn alloc_with(&mut self, node: Node, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        let id = self.alloc(node);
        for child in children {
            self.append_child(id, child);
        }
        id
    }

    fn slot(&self, id: NodeId) -> &Slot {
        match self.slots.get(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("stale node handle {id:?}"),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        match self.slots.get_mut(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("stale node handle {id:?}"),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.slot(id).node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slot_mut(id).node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn text(&self, id: NodeId) -> Option<&TextSpan> {
        match self.node(id) {
            Node::Text(span) => Some(span),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut TextSpan> {
        match self.node_mut(id) {
            Node::Text(span) => Some(span),
            _ => None,
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    /// Inserts `child` at `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.slot_mut(child).parent = Some(parent);
        let children = &mut self.slot_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    pub fn index_in_parent(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Unlinks `child` from its parent, returning the index it occupied.
    pub fn detach(&mut self, child: NodeId) -> Option<usize> {
        let index = self.index_in_parent(child)?;
        if let Some(parent) = self.parent(child) {
            self.slot_mut(parent).children.remove(index);
        }
        self.slot_mut(child).parent = None;
        Some(index)
    }

    /// Unlinks and returns all children of `id`, ready to be transplanted.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.slot_mut(id).children);
        for &child in &children {
            self.slot_mut(child).parent = None;
        }
        children
    }

    /// Detaches `id` and releases it together with its whole subtree.
    pub fn free(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(next.0).and_then(Option::take) {
                stack.extend(slot.children);
                self.free.push(next.0);
            }
        }
    }

    /// Number of live nodes, root included.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Text leaves below `id` in document order.
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if matches!(self.node(next), Node::Text(_)) {
                out.push(next);
            }
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// The top-level block containing `id`.
    pub fn block_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return Some(current);
            }
            current = parent;
        }
    }
}
