use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("invalid document id: {0}")]
    InvalidId(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
