pub mod editing;
pub mod io;
pub mod layout;
pub mod parsing;
pub mod render;
pub mod serialize;
pub mod storage;
pub mod tree;

// Re-export key types for easier usage
pub use editing::{
    BlockRemap, Command, CommandStack, Cursor, CursorCoord, Document, EditError, Editor, Motion,
};
pub use io::{IoError, read_file, write_file};
pub use layout::{Layout, LayoutSettings, MonospaceLayout, Point};
pub use parsing::{Grammar, Parser, parse};
pub use render::{Instruction, Painter, RecordingPainter};
pub use storage::{Buffers, PieceRun, SpanError, TextSpan};
pub use tree::{Node, NodeId, Tree};
