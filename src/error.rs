//! Errors surfaced by image handles and the library lifecycle.

use crate::imaging::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An argument was outside its contract. Nothing was mutated.
    #[error("invalid argument: {0}")]
    Validation(String),
    /// The decoder hit its allocation limit while creating a handle.
    #[error("resource exhausted: {0}")]
    Resource(String),
    /// The backend failed to decode, resize or encode.
    #[error("{0}")]
    Library(String),
    #[error("library unavailable: {0}")]
    Init(String),
    #[error("image handle is closed")]
    Closed,
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::LimitExceeded(msg) => Error::Resource(msg),
            other => Error::Library(other.to_string()),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
