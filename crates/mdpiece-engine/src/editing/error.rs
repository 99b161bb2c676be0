use thiserror::Error;

use crate::{storage::SpanError, tree::NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Span(#[from] SpanError),
    #[error("block {index} is out of range for a document of {count} block(s)")]
    BlockOutOfRange { index: usize, count: usize },
    #[error("line {line} is out of range for block {block}")]
    LineOutOfRange { block: usize, line: usize },
    #[error("offset {offset} is past the end of a line of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),
}
