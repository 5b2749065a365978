//! Store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transfer record not found: {0}")]
    NotFound(String),

    #[error("malformed transfer record: {0}")]
    Malformed(&'static str),

    #[error("content not found for clear root {0}")]
    ContentNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}
