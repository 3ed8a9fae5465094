use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source error: {0}")]
    Source(#[from] rankwatch_core::SourceError),

    #[error("invalid snapshot file: {0}")]
    Invalid(String),
}
