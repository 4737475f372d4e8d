//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// None of these are fatal: callers surface them as a notice and keep the
/// prior state.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Page not found in the registry.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A page with this id already exists.
    #[error("Duplicate page id: {0}")]
    DuplicateKey(String),

    /// Page ids must be non-empty and free of whitespace.
    #[error("Invalid page id: {0:?}")]
    InvalidPageId(String),

    /// The operation is not valid in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The page is being regenerated and does not accept edits.
    #[error("Page is generating: {0}")]
    Generating(String),

    /// Nothing is selected.
    #[error("No element selected")]
    NoSelection,

    /// Content rendering failed (icons, data URLs).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
