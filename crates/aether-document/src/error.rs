//! Error types for document access and mutation.

use thiserror::Error;

use crate::store::NodeId;
use crate::types::ValueType;

/// Errors that can occur while reading or editing a document.
///
/// `Type` and `Bounds` signal a caller that misjudged the shape of the
/// document. Callers that do not know a node's type up front should check
/// `is_*()` before calling a typed accessor.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The operation requires a different node type.
    #[error("type error: expected {expected}, found {found}")]
    Type {
        expected: ValueType,
        found: ValueType,
    },

    /// An array or object index was out of range.
    #[error("index {index} out of bounds for length {len}")]
    Bounds { index: usize, len: usize },

    /// The handle refers to a node that no longer exists.
    #[error("stale node handle {0}")]
    StaleHandle(NodeId),

    /// The value has no JSON representation.
    #[error("cannot serialize {0} value to JSON")]
    Unserializable(ValueType),

    /// NaN and infinities have no JSON representation.
    #[error("cannot serialize non-finite number {0} to JSON")]
    NonFiniteNumber(f64),

    /// The input was not valid JSON, or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A recorded edit no longer matches the tree it is replayed against.
    #[error("undo history no longer matches node {0}")]
    HistoryMismatch(NodeId),
}

/// Convenience alias used throughout aether-document.
pub type Result<T> = std::result::Result<T, DocumentError>;
