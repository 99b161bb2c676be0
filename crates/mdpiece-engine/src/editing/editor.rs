use crate::layout::Point;

use super::{
    Cursor, CursorCoord, Document, EditError,
    commands::{Command, CommandStack, InsertLineBreak, InsertText, RemoveText},
};

/// Cursor motions a host binds to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

/// A document, its cursor, and the command history, edited together.
///
/// Every edit goes through the [`CommandStack`] so it can be undone.
///
/// ```rust
/// # use mdpiece_engine::editing::{Document, Editor};
/// let mut editor = Editor::new(Document::from_text(""));
/// editor.insert_text("#").unwrap();
/// editor.insert_text(" Title").unwrap();
/// assert_eq!(editor.to_markdown(), "# Title\n");
/// ```
#[derive(Debug)]
pub struct Editor {
    document: Document,
    cursor: Cursor,
    history: CommandStack,
    auto_pair: bool,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            cursor: Cursor::default(),
            history: CommandStack::default(),
            auto_pair: true,
        }
    }

    pub fn with_options(document: Document, undo_limit: usize, auto_pair: bool) -> Self {
        Self {
            document,
            cursor: Cursor::default(),
            history: CommandStack::new(undo_limit),
            auto_pair,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    pub fn set_cursor(&mut self, coord: CursorCoord) -> Result<(), EditError> {
        self.document.validate(coord)?;
        self.cursor.set_coord(coord);
        Ok(())
    }

    pub fn move_cursor(&mut self, motion: Motion) {
        let doc = &self.document;
        match motion {
            Motion::Left => self.cursor.move_left(doc),
            Motion::Right => self.cursor.move_right(doc),
            Motion::Up => self.cursor.move_up(doc),
            Motion::Down => self.cursor.move_down(doc),
            Motion::LineStart => self.cursor.move_to_line_start(),
            Motion::LineEnd => self.cursor.move_to_line_end(doc),
            Motion::DocumentStart => self.cursor.move_to_document_start(),
            Motion::DocumentEnd => self.cursor.move_to_document_end(doc),
        }
    }

    /// Places the cursor at a document-space point.
    pub fn click(&mut self, point: Point) {
        self.cursor.set_position(&self.document, point);
    }

    /// Types `text`. Newlines become line breaks and carriage returns are
    /// dropped; every other character is one insert so block promotion and
    /// bracket pairing apply as if typed.
    pub fn insert_text(&mut self, text: &str) -> Result<(), EditError> {
        for ch in text.chars() {
            match ch {
                '\r' => {}
                '\n' => self.insert_line_break()?,
                ch => {
                    let command = InsertText::with_auto_pair(ch.to_string(), self.auto_pair);
                    self.run(Command::InsertText(command))?;
                }
            }
        }
        Ok(())
    }

    pub fn remove_text(&mut self) -> Result<(), EditError> {
        self.run(Command::RemoveText(RemoveText::new()))
    }

    pub fn insert_line_break(&mut self) -> Result<(), EditError> {
        self.run(Command::InsertLineBreak(InsertLineBreak::new()))
    }

    pub fn undo(&mut self) -> Result<bool, EditError> {
        self.history.undo(&mut self.document, &mut self.cursor)
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        self.history.redo(&mut self.document, &mut self.cursor)
    }

    pub fn to_markdown(&self) -> String {
        self.document.to_markdown()
    }

    fn run(&mut self, command: Command) -> Result<(), EditError> {
        self.history
            .execute(command, &mut self.document, &mut self.cursor)
    }
}
