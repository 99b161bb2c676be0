mod code_fence;
mod heading;
mod latex_fence;
mod lists;
mod paragraph;
mod quote;
mod table;

pub use code_fence::CodeFence;
pub use heading::Heading;
pub use latex_fence::LatexFence;
pub use lists::{BulletMarker, CheckboxMarker, OrderedMarker};
pub use paragraph::Paragraph;
pub use quote::BlockQuote;
pub use table::{PipeTable, ThematicBreak};
