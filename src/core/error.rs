use std::io;
use thiserror::Error;

/// Hard failures only. Content problems in a document never surface here;
/// they accumulate into a [`crate::core::report::ValidationReport`] instead.
#[derive(Error, Debug)]
pub enum AttestError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("Invalid hash value: {0}")]
    InvalidHash(String),
    #[error("Signing failed: {0}")]
    SigningError(String),
    #[error("Document failed validation: {0}")]
    InvalidDocument(String),
    #[error("Unknown document kind: {0}")]
    UnknownKind(String),
}
