use navigation::NavigationError;
use shared::error::ApiError;
use thiserror::Error;

use crate::draft::DraftError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("unexpected response ({status}): {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("failed to encode hotspots: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    /// Decodes a non-2xx body, preferring the server's `{ error, message }` shape.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(error) => Self::Api { status, error },
            Err(_) => Self::Status {
                status,
                body: body.trim().to_string(),
            },
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}
