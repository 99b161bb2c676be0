//! # Layout collaborator
//!
//! Turns one top-level block into measured geometry: logical lines, their
//! wrapped visual lines, and the cells on each visual line. Cursor mapping
//! in both directions goes through this geometry.
//!
//! [`Layout`] is the seam a host implements with real font metrics.
//! [`MonospaceLayout`] is the reference implementation: every column is
//! `cell_width` wide and widths come from `unicode-width`.

mod block;
mod monospace;

pub use block::{Block, Cell, CellKind, LineAnchor, LogicalLine, Shade, TextStyle, VisualLine};
pub use monospace::MonospaceLayout;

use serde::{Deserialize, Serialize};

use crate::{
    storage::Buffers,
    tree::{NodeId, Tree},
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Metrics shared by layout implementations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Wrap width, in the same unit as `cell_width`.
    pub max_width: f32,
    pub cell_width: f32,
    pub line_height: f32,
    /// Vertical gap between blocks.
    pub block_spacing: f32,
    pub image_width: f32,
    pub image_height: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_width: 80.0,
            cell_width: 1.0,
            line_height: 1.0,
            block_spacing: 1.0,
            image_width: 8.0,
            image_height: 1.0,
        }
    }
}

/// Produces the geometry of a block. Implementations must be deterministic:
/// the same subtree and buffers always yield the same [`Block`].
pub trait Layout {
    fn layout(&self, tree: &Tree, buffers: &Buffers, block: NodeId) -> Block;

    fn settings(&self) -> &LayoutSettings;
}
