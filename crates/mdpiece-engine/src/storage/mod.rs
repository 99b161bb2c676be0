//! # Text storage
//!
//! The document's characters live in two buffers and are never rewritten:
//!
//! - the **original** buffer holds the loaded text,
//! - the **added** buffer holds everything typed since, append-only.
//!
//! Text nodes reference the buffers through [`PieceRun`]s collected in a
//! [`TextSpan`]. All offsets and lengths are UTF-16 code units, so a
//! surrogate-pair emoji occupies two units.
//!
//! ## Modules
//!
//! - [`buffers`]: the two backing buffers
//! - [`span`]: piece runs and the text span leaf built from them

pub mod buffers;
pub mod span;

pub use buffers::{Buffers, is_high_surrogate, is_low_surrogate};
pub use span::{PieceRun, Source, SpanError, TextSpan};
