//! Codec and proof error types.

use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ciphertext stream truncated in record {index}")]
    Truncated { index: u64 },

    #[error("cipher commitment mismatch: expected {expected}, got {actual}")]
    CipherInconsistent { expected: String, actual: String },
}

pub type ProofResult<T> = Result<T, ProofError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("leaf index {index} out of range (leaf count {leaf_count})")]
    IndexOutOfRange { index: u64, leaf_count: u64 },

    #[error("malformed proof encoding: {0}")]
    Malformed(&'static str),
}
