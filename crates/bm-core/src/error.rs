//! Error types for the document model.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid color `{0}`")]
    InvalidColor(String),

    #[error("invalid dash pattern `{0}`")]
    InvalidDash(String),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("project JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
