use log::debug;

use crate::editing::{Cursor, Document, EditError};

use super::Command;

pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Executed commands, oldest first. `top` splits the undo side from the
/// redo side.
#[derive(Debug, Clone)]
pub struct CommandStack {
    commands: Vec<Command>,
    top: usize,
    limit: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl CommandStack {
    pub fn new(limit: usize) -> Self {
        Self {
            commands: Vec::new(),
            top: 0,
            limit: limit.max(1),
        }
    }

    /// Runs `command` and records it.
    pub fn execute(
        &mut self,
        mut command: Command,
        doc: &mut Document,
        cursor: &mut Cursor,
    ) -> Result<(), EditError> {
        command.execute(doc, cursor)?;
        self.push(command);
        Ok(())
    }

    /// Records an already executed command.
    ///
    /// The redo side is dropped. A command that cannot be undone clears the
    /// history: older entries were recorded against a tree that no longer
    /// exists.
    pub fn push(&mut self, command: Command) {
        self.commands.truncate(self.top);
        if !command.is_reversible() {
            debug!(
                "{} is not reversible, dropping {} history entries",
                command.name(),
                self.commands.len()
            );
            self.commands.clear();
            self.top = 0;
            return;
        }
        if let Some(last) = self.commands.last_mut() {
            if last.try_merge(&command) {
                return;
            }
        }
        self.commands.push(command);
        if self.commands.len() > self.limit {
            let excess = self.commands.len() - self.limit;
            self.commands.drain(..excess);
        }
        self.top = self.commands.len();
    }

    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<bool, EditError> {
        if self.top == 0 {
            return Ok(false);
        }
        self.top -= 1;
        let command = &mut self.commands[self.top];
        debug!("undo {}", command.name());
        command.undo(doc, cursor)?;
        Ok(true)
    }

    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<bool, EditError> {
        let Some(command) = self.commands.get_mut(self.top) else {
            return Ok(false);
        };
        debug!("redo {}", command.name());
        command.redo(doc, cursor)?;
        self.top += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.top > 0
    }

    pub fn can_redo(&self) -> bool {
        self.top < self.commands.len()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
