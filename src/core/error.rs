//! Error types for document store operations

use super::document::InvalidName;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named document does not exist.
    #[error("{0} does not exist.")]
    NotFound(String),

    /// A document with this name is already present.
    #[error("{0} already exists.")]
    AlreadyExists(String),

    /// The name cannot be mapped onto a file inside the store root.
    #[error(transparent)]
    InvalidName(#[from] InvalidName),

    /// No renderer is registered for the document's extension.
    #[error("{name} has an unsupported type")]
    UnsupportedType { name: String },

    /// Directory enumeration failed.
    #[error("failed to list documents: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
