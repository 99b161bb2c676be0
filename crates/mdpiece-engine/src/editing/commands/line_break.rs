use log::debug;

use crate::{
    editing::{
        Cursor, CursorCoord, Document, EditError,
        surgery::{concat_text, seam_at, split_children, starts_with, trim_line_feeds},
    },
    parsing::blocks::kinds::CodeFence,
    storage::TextSpan,
    tree::{Node, NodeId},
};

use super::RemoveText;

/// How to take a line break back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Irreversible,
    /// Block `.0` was split in two; merging them restores it.
    Blocks(usize),
    /// A line was split inside its block; backspace at the new line joins it.
    Join,
    /// An empty paragraph was added after block `.0`.
    After(usize),
}

/// Enter: splits the current line, or the current block, at the cursor.
#[derive(Debug, Clone)]
pub struct InsertLineBreak {
    coord: CursorCoord,
    finished: CursorCoord,
    plan: Plan,
}

impl Default for InsertLineBreak {
    fn default() -> Self {
        Self::new()
    }
}

impl InsertLineBreak {
    pub fn new() -> Self {
        Self {
            coord: CursorCoord::default(),
            finished: CursorCoord::default(),
            plan: Plan::Irreversible,
        }
    }

    pub fn coord(&self) -> CursorCoord {
        self.coord
    }

    pub fn finished(&self) -> CursorCoord {
        self.finished
    }

    pub fn is_reversible(&self) -> bool {
        self.plan != Plan::Irreversible
    }

    pub fn execute(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        let c = cursor.coord();
        doc.validate(c)?;
        self.coord = c;

        let block = doc.block(c.block_no)?;
        let kind = doc.tree().node(block).clone();
        let (plan, finished) = match &kind {
            k if k.is_read_only() => {
                let paragraph = doc.tree_mut().alloc(Node::Paragraph);
                doc.insert_block(c.block_no + 1, paragraph)?;
                (Plan::After(c.block_no), CursorCoord::new(c.block_no + 1, 0, 0))
            }
            Node::Paragraph | Node::Header { .. } => self.split_block(doc, block, &kind)?,
            Node::LatexBlock => {
                let seam = seam_at(doc.line(c)?, c.offset);
                doc.edit_block(c.block_no, |tree, _, block| -> Result<(), EditError> {
                    let (left, right) = split_children(tree, block, seam)?;
                    let lf = tree.alloc(Node::Lf);
                    for node in left.into_iter().chain([lf]).chain(right) {
                        tree.append_child(block, node);
                    }
                    Ok(())
                })??;
                (Plan::Join, CursorCoord::new(c.block_no, c.line_no + 1, 0))
            }
            Node::CodeBlock { .. } | Node::QuoteBlock => {
                let line = doc.line(c)?;
                let (index, target) = (line.anchor.start, line.text_at(c.offset));
                doc.edit_block(c.block_no, |tree, _, block| -> Result<(), EditError> {
                    let existing = tree.children(block).get(index).copied();
                    match existing.filter(|&t| tree.text(t).is_some()) {
                        Some(text) => {
                            let at = target.map(|(_, local)| local).unwrap_or(0);
                            let span = tree.text(text).ok_or(EditError::NotText(text))?;
                            let (left, right) = span.split(at)?;
                            if let Some(span) = tree.text_mut(text) {
                                *span = left;
                            }
                            let next = tree.alloc_text(right);
                            tree.insert_child(block, index + 1, next);
                        }
                        None => {
                            for at in [index, index + 1] {
                                let empty = tree.alloc_text(TextSpan::new());
                                tree.insert_child(block, at, empty);
                            }
                        }
                    }
                    Ok(())
                })??;
                (Plan::Join, CursorCoord::new(c.block_no, c.line_no + 1, 0))
            }
            k if k.is_list() => self.split_item(doc, block, &kind)?,
            _ => (Plan::Irreversible, c),
        };

        self.plan = plan;
        self.finished = finished;
        cursor.set_coord(finished);
        Ok(())
    }

    /// Splits a paragraph or header into two blocks. A paragraph whose first
    /// line left of the cursor reads as a code fence becomes a code block.
    fn split_block(
        &self,
        doc: &mut Document,
        block: NodeId,
        kind: &Node,
    ) -> Result<(Plan, CursorCoord), EditError> {
        let c = self.coord;
        let seam = seam_at(doc.line(c)?, c.offset);
        let (tree, buffers) = doc.parts_mut();
        let (mut left, mut right) = split_children(tree, block, seam)?;
        let trimmed = trim_line_feeds(tree, &mut left, &mut right);

        let fence = matches!(kind, Node::Paragraph)
            && c.line_no == 0
            && starts_with(tree, buffers, &left, CodeFence::BACKTICKS);
        if fence {
            let (_, name) = concat_text(tree, &left).split(CodeFence::BACKTICKS.len())?;
            for node in left {
                tree.free(node);
            }
            let code = tree.alloc(Node::CodeBlock { name });
            let rest = (!right.is_empty()).then(|| tree.alloc_with(Node::Paragraph, right));
            doc.replace_block(c.block_no, code)?;
            if let Some(rest) = rest {
                doc.insert_block(c.block_no + 1, rest)?;
            }
            debug!("block {} became a code block", c.block_no);
            return Ok((Plan::Irreversible, CursorCoord::new(c.block_no, 0, 0)));
        }

        let right_kind = match kind {
            Node::Header { .. } if right.is_empty() => Node::Paragraph,
            other => other.clone(),
        };
        let first = tree.alloc_with(kind.clone(), left);
        let second = tree.alloc_with(right_kind, right);
        doc.replace_block(c.block_no, first)?;
        doc.insert_block(c.block_no + 1, second)?;

        let plan = if trimmed {
            Plan::Irreversible
        } else {
            Plan::Blocks(c.block_no)
        };
        Ok((plan, CursorCoord::new(c.block_no + 1, 0, 0)))
    }

    /// Splits a list item. Enter on an empty item leaves the list instead.
    fn split_item(
        &self,
        doc: &mut Document,
        block: NodeId,
        kind: &Node,
    ) -> Result<(Plan, CursorCoord), EditError> {
        let c = self.coord;
        let items = doc.tree().children(block).to_vec();
        let Some(&item) = items.get(c.line_no) else {
            return Err(EditError::LineOutOfRange {
                block: c.block_no,
                line: c.line_no,
            });
        };

        let line = doc.line(c)?;
        if line.is_empty() && line.trailing_image(c.offset).is_none() {
            return self.leave_list(doc, &items, kind);
        }

        let seam = seam_at(doc.line(c)?, c.offset);
        let item_kind = doc.tree().node(item).clone();
        doc.edit_block(c.block_no, |tree, _, block| -> Result<(), EditError> {
            let (left, right) = split_children(tree, item, seam)?;
            tree.free(item);
            let next_kind = match &item_kind {
                Node::CheckboxItem { .. } => Node::CheckboxItem { checked: false },
                other => other.clone(),
            };
            let first = tree.alloc_with(item_kind, left);
            let second = tree.alloc_with(next_kind, right);
            tree.insert_child(block, c.line_no, first);
            tree.insert_child(block, c.line_no + 1, second);
            Ok(())
        })??;
        Ok((Plan::Join, CursorCoord::new(c.block_no, c.line_no + 1, 0)))
    }

    /// Turns the empty item into a paragraph, splitting the list around it
    /// when needed.
    fn leave_list(
        &self,
        doc: &mut Document,
        items: &[NodeId],
        kind: &Node,
    ) -> Result<(Plan, CursorCoord), EditError> {
        let c = self.coord;
        let (b, index) = (c.block_no, c.line_no);
        let item = items[index];
        let paragraph = doc.tree_mut().alloc(Node::Paragraph);

        let at = if items.len() == 1 {
            doc.replace_block(b, paragraph)?;
            b
        } else if index == 0 {
            doc.edit_block(b, |tree, _, _| tree.free(item))?;
            doc.insert_block(b, paragraph)?;
            b
        } else {
            let tail = items[index + 1..].to_vec();
            doc.edit_block(b, |tree, _, _| {
                tree.free(item);
                for &rest in &tail {
                    tree.detach(rest);
                }
            })?;
            doc.insert_block(b + 1, paragraph)?;
            if !tail.is_empty() {
                let after = doc.tree_mut().alloc_with(kind.clone(), tail);
                doc.insert_block(b + 2, after)?;
            }
            b + 1
        };
        debug!("left list at block {b} item {index}");
        Ok((Plan::Irreversible, CursorCoord::new(at, 0, 0)))
    }

    pub fn undo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        match self.plan {
            Plan::Irreversible => {}
            Plan::Blocks(b) => {
                doc.merge_block(b)?;
            }
            Plan::Join => {
                cursor.set_coord(self.finished);
                RemoveText::new().execute_past_images(doc, cursor)?;
            }
            Plan::After(b) => {
                doc.remove_block(b + 1)?;
            }
        }
        cursor.set_coord(self.coord);
        Ok(())
    }
}
