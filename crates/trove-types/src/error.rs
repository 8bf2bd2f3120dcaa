use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid kind: {0:?}")]
    InvalidKind(String),

    #[error("invalid key name: {0:?}")]
    InvalidKeyName(String),

    #[error("key {key} is incomplete")]
    IncompleteKey { key: String },
}
