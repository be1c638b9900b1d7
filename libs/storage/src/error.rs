//! Error types for the object store

use thiserror::Error;

/// Errors raised by object store backends
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying database failure
    #[error("Storage database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An object with this filename is already stored
    #[error("An object named {0} already exists")]
    AlreadyExists(String),

    /// A chunk expected from the object's length is absent
    #[error("Chunk {n} of {filename} is missing")]
    MissingChunk { filename: String, n: u32 },

    /// Chunk size must be strictly positive
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;
