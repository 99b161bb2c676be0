use std::fmt;

use log::debug;

use crate::{
    layout::{Block, Layout, LayoutSettings, LogicalLine, MonospaceLayout, Point},
    parsing::Parser,
    render::{self, Instruction},
    serialize,
    storage::{Buffers, PieceRun, TextSpan},
    tree::{Node, NodeId, Tree},
};

use super::{
    BlockRemap, CursorCoord, EditError, ListJoin,
    surgery::{append_inline, flatten_block},
};

/// A parsed document together with its layout cache.
///
/// The cache holds one [`Block`] per top-level block, in tree order. Every
/// mutation below goes through a primitive that relayouts what it touched,
/// so callers never see stale geometry.
///
/// ```rust
/// # use mdpiece_engine::editing::{CursorCoord, Document};
/// let doc = Document::from_bytes(b"# Title\nbody").unwrap();
/// assert_eq!(doc.block_count(), 2);
/// assert_eq!(doc.line_text(CursorCoord::new(1, 0, 0)).unwrap(), "body");
/// ```
pub struct Document {
    buffers: Buffers,
    tree: Tree,
    blocks: Vec<Block>,
    layout: Box<dyn Layout>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("blocks", &self.blocks.len())
            .field("original_len", &self.buffers.original().len())
            .field("added_len", &self.buffers.added().len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Parses `text` with the editable grammar and the monospace layout.
    pub fn from_text(text: &str) -> Self {
        Self::with_layout(text, Parser::default(), Box::new(MonospaceLayout::default()))
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// A document with no blocks gets one empty paragraph so there is always
    /// somewhere to put the cursor.
    pub fn with_layout(text: &str, parser: Parser, layout: Box<dyn Layout>) -> Self {
        let buffers = Buffers::new(text);
        let mut tree = parser.parse_units(buffers.original());
        if tree.blocks().is_empty() {
            let root = tree.root();
            let paragraph = tree.alloc(Node::Paragraph);
            tree.append_child(root, paragraph);
        }
        let mut doc = Self {
            buffers,
            tree,
            blocks: Vec::new(),
            layout,
        };
        doc.relayout_all();
        debug!(
            "loaded document: {} units, {} block(s)",
            doc.buffers.original().len(),
            doc.block_count()
        );
        doc
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn settings(&self) -> &LayoutSettings {
        self.layout.settings()
    }

    pub fn set_layout(&mut self, layout: Box<dyn Layout>) {
        self.layout = layout;
        self.relayout_all();
    }

    /// Tree access for building detached nodes before a block primitive
    /// adopts them. Edits to attached blocks must go through
    /// [`Document::edit_block`].
    pub(crate) fn parts_mut(&mut self) -> (&mut Tree, &Buffers) {
        (&mut self.tree, &self.buffers)
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn append_text(&mut self, text: &str) -> PieceRun {
        self.buffers.append(text)
    }

    fn relayout_all(&mut self) {
        self.blocks = self
            .tree
            .blocks()
            .iter()
            .map(|&b| self.layout.layout(&self.tree, &self.buffers, b))
            .collect();
    }

    fn relayout(&mut self, index: usize) {
        if let Some(&block) = self.tree.blocks().get(index) {
            self.blocks[index] = self.layout.layout(&self.tree, &self.buffers, block);
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> Result<NodeId, EditError> {
        self.tree
            .blocks()
            .get(index)
            .copied()
            .ok_or(EditError::BlockOutOfRange {
                index,
                count: self.block_count(),
            })
    }

    pub fn block_layout(&self, index: usize) -> Result<&Block, EditError> {
        self.blocks.get(index).ok_or(EditError::BlockOutOfRange {
            index,
            count: self.block_count(),
        })
    }

    pub fn block_layouts(&self) -> &[Block] {
        &self.blocks
    }

    /// The logical line `coord` points into. The offset is not checked.
    pub fn line(&self, coord: CursorCoord) -> Result<&LogicalLine, EditError> {
        self.block_layout(coord.block_no)?
            .line(coord.line_no)
            .ok_or(EditError::LineOutOfRange {
                block: coord.block_no,
                line: coord.line_no,
            })
    }

    /// Text units of the line `coord` points into.
    pub fn line_units(&self, coord: CursorCoord) -> Result<Vec<u16>, EditError> {
        let line = self.line(coord)?;
        let mut out = Vec::with_capacity(line.len());
        for cell in line.text_cells() {
            let span = self.tree.text(cell.node).ok_or(EditError::NotText(cell.node))?;
            let units = span.units(&self.buffers);
            if let Some(slice) = units.get(cell.node_offset..cell.node_offset + cell.len) {
                out.extend_from_slice(slice);
            }
        }
        Ok(out)
    }

    pub fn line_text(&self, coord: CursorCoord) -> Result<String, EditError> {
        Ok(String::from_utf16_lossy(&self.line_units(coord)?))
    }

    /// The unit right of `coord`, if any.
    pub fn unit_at(&self, coord: CursorCoord) -> Option<u16> {
        self.line_units(coord).ok()?.get(coord.offset).copied()
    }

    /// Checks `coord` names an existing line and an offset inside it.
    pub fn validate(&self, coord: CursorCoord) -> Result<(), EditError> {
        let len = self.line(coord)?.len();
        if coord.offset > len {
            return Err(EditError::OffsetOutOfRange {
                offset: coord.offset,
                len,
            });
        }
        Ok(())
    }

    /// End of the last line of block `index`.
    pub fn block_end(&self, index: usize) -> Result<CursorCoord, EditError> {
        let block = self.block_layout(index)?;
        let line_no = block.line_count().saturating_sub(1);
        let offset = block.line(line_no).map(LogicalLine::len).unwrap_or(0);
        Ok(CursorCoord::new(index, line_no, offset))
    }

    /// Document `y` of the top of block `index`. Blocks are separated by
    /// `block_spacing`.
    pub fn block_top(&self, index: usize) -> f32 {
        let spacing = self.settings().block_spacing;
        self.blocks
            .iter()
            .take(index)
            .map(|b| b.height + spacing)
            .sum()
    }

    pub fn height(&self) -> f32 {
        let spacing = self.settings().block_spacing;
        (self.block_top(self.blocks.len()) - spacing).max(0.0)
    }

    /// Swaps block `index` for the detached `node`, freeing the old block.
    pub fn replace_block(&mut self, index: usize, node: NodeId) -> Result<BlockRemap, EditError> {
        let old = self.block(index)?;
        debug!(
            "replace block {index}: {} -> {}",
            self.tree.node(old).label(),
            self.tree.node(node).label()
        );
        debug_assert!(self.tree.parent(node).is_none(), "{node:?} is attached");
        let root = self.tree.root();
        self.tree.free(old);
        self.tree.insert_child(root, index, node);
        self.relayout(index);
        Ok(BlockRemap::Unchanged)
    }

    /// Adopts the detached `node` as block `index`; `index` may equal the
    /// block count to append.
    pub fn insert_block(&mut self, index: usize, node: NodeId) -> Result<BlockRemap, EditError> {
        let count = self.block_count();
        if index > count {
            return Err(EditError::BlockOutOfRange { index, count });
        }
        debug!("insert block {index}: {}", self.tree.node(node).label());
        debug_assert!(self.tree.parent(node).is_none(), "{node:?} is attached");
        let root = self.tree.root();
        self.tree.insert_child(root, index, node);
        let block = self.layout.layout(&self.tree, &self.buffers, node);
        self.blocks.insert(index, block);
        Ok(BlockRemap::Inserted(index))
    }

    /// Frees block `index`. Removing the only block leaves an empty
    /// paragraph in its place.
    pub fn remove_block(&mut self, index: usize) -> Result<BlockRemap, EditError> {
        let old = self.block(index)?;
        debug!("remove block {index}: {}", self.tree.node(old).label());
        if self.block_count() == 1 {
            let paragraph = self.tree.alloc(Node::Paragraph);
            return self.replace_block(index, paragraph);
        }
        self.tree.free(old);
        self.blocks.remove(index);
        Ok(BlockRemap::Removed(index))
    }

    /// Runs `f` on block `index` in place, then relayouts it.
    pub fn edit_block<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Tree, &Buffers, NodeId) -> R,
    ) -> Result<R, EditError> {
        let block = self.block(index)?;
        let out = f(&mut self.tree, &self.buffers, block);
        debug_assert_eq!(
            self.tree.blocks().len(),
            self.blocks.len(),
            "edit_block must not add or remove blocks"
        );
        self.relayout(index);
        Ok(out)
    }

    /// Moves the content of block `index + 1` onto the end of the last line
    /// of block `index` and frees the emptied block.
    ///
    /// Lists and line-per-text blocks contribute their lines joined by line
    /// feeds. A code or quote target takes the content as new lines. Merging
    /// into or out of a read-only block does nothing.
    pub fn merge_block(&mut self, index: usize) -> Result<BlockRemap, EditError> {
        let target = self.block(index)?;
        let source = self.block(index + 1)?;
        if self.tree.node(target).is_read_only() || self.tree.node(source).is_read_only() {
            return Ok(BlockRemap::Unchanged);
        }
        let anchor = self
            .block_layout(index)?
            .lines
            .last()
            .map(|l| l.anchor)
            .ok_or(EditError::LineOutOfRange {
                block: index,
                line: 0,
            })?;
        debug!(
            "merge block {} ({}) into {index} ({})",
            index + 1,
            self.tree.node(source).label(),
            self.tree.node(target).label()
        );

        let moved = flatten_block(&mut self.tree, source);
        let tree = &mut self.tree;
        if matches!(tree.node(target), Node::CodeBlock { .. } | Node::QuoteBlock) {
            let mut line = match tree.children(target).get(anchor.start).copied() {
                Some(text) if tree.text(text).is_some() => text,
                _ => {
                    let text = tree.alloc_text(TextSpan::new());
                    tree.append_child(target, text);
                    text
                }
            };
            for node in moved {
                if matches!(tree.node(node), Node::Lf) {
                    line = tree.alloc_text(TextSpan::new());
                    tree.append_child(target, line);
                } else {
                    let span = super::surgery::concat_text(tree, &[node]);
                    if let Some(text) = tree.text_mut(line) {
                        text.append(span);
                    }
                }
                tree.free(node);
            }
        } else {
            append_inline(tree, anchor.owner, moved);
        }

        self.tree.free(source);
        self.blocks.remove(index + 1);
        self.relayout(index);
        Ok(BlockRemap::Removed(index + 1))
    }

    /// Joins block `index` with the blocks on either side that are lists of
    /// its own kind. Their Markdown would read back as one list, so the tree
    /// holds one list too.
    pub fn join_lists(&mut self, index: usize) -> Result<ListJoin, EditError> {
        let below = self.join_list_pair(index)?;
        let above = match index {
            0 => None,
            _ => self.join_list_pair(index - 1)?,
        };
        Ok(ListJoin { above, below })
    }

    /// Undoes [`Document::join_lists`] on block `index`.
    pub fn split_lists(&mut self, index: usize, join: ListJoin) -> Result<(), EditError> {
        if let Some(items) = join.above {
            self.split_list(index - 1, items)?;
        }
        if let Some(items) = join.below {
            self.split_list(index, items)?;
        }
        Ok(())
    }

    /// Appends the items of block `upper + 1` to block `upper` when both are
    /// lists of one kind. Returns the item count `upper` had before.
    fn join_list_pair(&mut self, upper: usize) -> Result<Option<usize>, EditError> {
        let Ok(lower) = self.block(upper + 1) else {
            return Ok(None);
        };
        let list = self.block(upper)?;
        let kind = self.tree.node(list);
        if !kind.is_list() || kind != self.tree.node(lower) {
            return Ok(None);
        }
        debug!("join list block {} into {upper}", upper + 1);
        let items = self.tree.children(list).len();
        for item in self.tree.take_children(lower) {
            self.tree.append_child(list, item);
        }
        self.tree.free(lower);
        self.blocks.remove(upper + 1);
        self.relayout(upper);
        Ok(Some(items))
    }

    /// Moves the items of list block `index` from `at` on into a new list
    /// block right below it.
    fn split_list(&mut self, index: usize, at: usize) -> Result<BlockRemap, EditError> {
        let list = self.block(index)?;
        let kind = self.tree.node(list).clone();
        let tail = self.tree.children(list).get(at..).unwrap_or_default().to_vec();
        for &item in &tail {
            self.tree.detach(item);
        }
        let lower = self.tree.alloc_with(kind, tail);
        self.relayout(index);
        self.insert_block(index + 1, lower)
    }

    /// Paint instructions for every block, stacked top to bottom.
    pub fn paint(&self) -> Vec<Instruction> {
        let spacing = self.settings().block_spacing;
        let mut out = Vec::new();
        let mut y = 0.0;
        for block in &self.blocks {
            out.extend(render::paint(block, Point::new(0.0, y)));
            y += block.height + spacing;
        }
        out
    }

    pub fn to_markdown(&self) -> String {
        serialize::to_markdown(&self.tree, &self.buffers)
    }
}
