//! Error types for accounts and project storage.

use bm_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("you need to be signed in")]
    NotAuthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid email address `{0}`")]
    InvalidEmail(String),

    #[error("password must have at least {0} characters")]
    WeakPassword(usize),

    #[error("an account already exists for `{0}`")]
    UserExists(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("project JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
