//! Error types for the chunk database

use thiserror::Error;

/// Result type alias for chunkdb operations
pub type Result<T> = std::result::Result<T, ChunkDbError>;

/// Error types that can occur in chunkdb operations
#[derive(Error, Debug)]
pub enum ChunkDbError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid entity: {reason}")]
    InvalidEntity { reason: String },

    #[error("Index is not built. Build the index before searching.")]
    IndexNotBuilt,
}

impl ChunkDbError {
    /// Shorthand for an `InvalidEntity` error with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        ChunkDbError::InvalidEntity {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound` error for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ChunkDbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
