//! Error taxonomy for the decryption core.

use std::io;

use thiserror::Error;

/// A fixed table failed validation while the table set was being built.
///
/// This is a defect in the constants, never a runtime input condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("table {table}: entry {value} out of range (limit {bound})")]
pub struct TableError {
    pub table: &'static str,
    pub value: usize,
    pub bound: usize,
}

#[derive(Error, Debug)]
pub enum DesError {
    #[error("malformed constant table: {0}")]
    Configuration(#[from] TableError),

    #[error("ciphertext length {len} is not a positive multiple of 8 bytes")]
    InputFormat { len: u64 },

    #[error("decryption failed: wrong key or corrupted data")]
    Padding,

    #[error("malformed {kind}: {reason}")]
    MalformedFile { kind: &'static str, reason: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DesError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        DesError::MalformedFile {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DesError> = std::result::Result<T, E>;
