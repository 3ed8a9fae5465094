use thiserror::Error;

/// Errors raised by the collaborators behind [`crate::source`] traits.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
