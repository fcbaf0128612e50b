//! Client error types

use thiserror::Error;

use crate::services::FieldError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a failure envelope or a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    /// The response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Input rejected before any request was sent
    #[error("invalid input")]
    Validation(Vec<FieldError>),

    /// The local store could not be read or written
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    pub fn invalid(path: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(path, message)])
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
