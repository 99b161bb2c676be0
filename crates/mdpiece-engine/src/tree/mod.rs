//! # Document tree
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`]
//! handles. Every node records its parent as a plain handle, so walking
//! upward from a text leaf during an edit never aliases ownership.
//!
//! The root is a [`Node::Container`]; its direct children are the document's
//! blocks.

mod arena;
mod node;

pub use arena::{NodeId, Tree};
pub use node::{Emphasis, Node};
