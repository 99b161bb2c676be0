/*!
 * # Editing
 *
 * Cursor-driven edits over a parsed [`Document`].
 *
 * ## Model
 *
 * - The document owns the text buffers, the node tree and one cached layout
 *   [`crate::layout::Block`] per top-level block.
 * - A [`CursorCoord`] names a block, a logical line inside it, and a UTF-16
 *   offset inside that line. The block's layout resolves it to a text node
 *   and a local offset.
 * - Edits are [`commands`]: insert text, remove text, insert line break.
 *   Each dispatches on the node kind of the block under the cursor, mutates
 *   the tree through the document's block primitives, and moves the cursor.
 * - Block primitives return a [`BlockRemap`] describing how block indices
 *   shifted; callers holding coordinates apply it.
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` and the replace/insert/remove/merge primitives
 * - **`cursor`**: `CursorCoord` and `Cursor` navigation
 * - **`commands`**: the edit commands and the undo `CommandStack`
 * - **`editor`**: `Editor`, the document + cursor + history facade hosts use
 * - **`remap`**: block index shifts after structural edits
 */

pub mod commands;
pub mod cursor;
pub mod document;
pub mod editor;
pub mod error;
pub mod remap;
pub(crate) mod surgery;

pub use commands::{
    Command, CommandStack, DEFAULT_UNDO_LIMIT, InsertLineBreak, InsertText, RemoveText,
};
pub use cursor::{Cursor, CursorCoord};
pub use document::Document;
pub use editor::{Editor, Motion};
pub use error::EditError;
pub use remap::{BlockRemap, ListJoin};
