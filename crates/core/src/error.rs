use thiserror::Error;

/// A create-notice payload that does not have the expected shape.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid deadline '{value}': expected ISO-8601 date or date/time")]
    InvalidDeadline { value: String },
}
