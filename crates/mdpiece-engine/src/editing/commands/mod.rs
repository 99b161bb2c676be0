//! Undoable edit commands.
//!
//! A command captures the cursor it ran at, mutates the document through
//! the block primitives, and leaves the cursor where the user expects it.
//! [`CommandStack`] records executed commands for undo and redo.

mod history;
mod insert_text;
mod line_break;
mod remove_text;

pub use history::{CommandStack, DEFAULT_UNDO_LIMIT};
pub use insert_text::InsertText;
pub use line_break::InsertLineBreak;
pub use remove_text::RemoveText;

use crate::{
    storage::{PieceRun, TextSpan},
    tree::Node,
};

use super::{Cursor, CursorCoord, Document, EditError};

#[derive(Debug, Clone)]
pub enum Command {
    InsertText(InsertText),
    RemoveText(RemoveText),
    InsertLineBreak(InsertLineBreak),
}

impl Command {
    pub fn execute(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        match self {
            Command::InsertText(c) => c.execute(doc, cursor),
            Command::RemoveText(c) => c.execute(doc, cursor),
            Command::InsertLineBreak(c) => c.execute(doc, cursor),
        }
    }

    pub fn undo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        match self {
            Command::InsertText(c) => c.undo(doc, cursor),
            Command::RemoveText(c) => c.undo(doc, cursor),
            Command::InsertLineBreak(c) => c.undo(doc, cursor),
        }
    }

    /// Runs an undone command again from where it first ran.
    pub fn redo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        cursor.set_coord(self.coord());
        self.execute(doc, cursor)
    }

    /// Cursor the command last executed at.
    pub fn coord(&self) -> CursorCoord {
        match self {
            Command::InsertText(c) => c.coord(),
            Command::RemoveText(c) => c.coord(),
            Command::InsertLineBreak(c) => c.coord(),
        }
    }

    /// Whether [`Command::undo`] restores the exact prior document.
    pub fn is_reversible(&self) -> bool {
        match self {
            Command::InsertText(_) => true,
            Command::RemoveText(c) => c.is_reversible(),
            Command::InsertLineBreak(c) => c.is_reversible(),
        }
    }

    /// Folds `next` into `self` when both are one typing burst.
    pub fn try_merge(&mut self, next: &Command) -> bool {
        match (self, next) {
            (Command::InsertText(a), Command::InsertText(b)) => a.merge(b),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::InsertText(_) => "insert-text",
            Command::RemoveText(_) => "remove-text",
            Command::InsertLineBreak(_) => "insert-line-break",
        }
    }
}

/// Inserts `run` at `coord`.
///
/// At the end of a line closing with an image the run becomes a new text
/// after the image. Otherwise on a line with text the run goes into the text
/// under the cursor. An empty code or quote line reuses its line text; any
/// other empty line gets a new text node at the end of its child range.
pub(crate) fn insert_run(
    doc: &mut Document,
    coord: CursorCoord,
    run: PieceRun,
) -> Result<(), EditError> {
    let line = doc.line(coord)?;
    let anchor = line.anchor;
    let target = line.text_at(coord.offset);
    let image = line.trailing_image(coord.offset);

    doc.edit_block(coord.block_no, |tree, _, block| -> Result<(), EditError> {
        if let Some(image) = image {
            let text = tree.alloc_text(TextSpan::from_run(run));
            let parent = tree.parent(image).unwrap_or(anchor.owner);
            let index = tree.index_in_parent(image).map_or(anchor.end, |i| i + 1);
            tree.insert_child(parent, index, text);
            return Ok(());
        }
        if let Some((node, local)) = target {
            let span = tree.text_mut(node).ok_or(EditError::NotText(node))?;
            span.insert(local, run)?;
            return Ok(());
        }
        if matches!(tree.node(block), Node::CodeBlock { .. } | Node::QuoteBlock) {
            let existing = tree.children(block).get(anchor.start).copied();
            if let Some(span) = existing.and_then(|t| tree.text_mut(t)) {
                span.insert(0, run)?;
                return Ok(());
            }
            let text = tree.alloc_text(TextSpan::from_run(run));
            tree.insert_child(block, anchor.start, text);
            return Ok(());
        }
        let text = tree.alloc_text(TextSpan::from_run(run));
        tree.insert_child(anchor.owner, anchor.end, text);
        Ok(())
    })?
}
