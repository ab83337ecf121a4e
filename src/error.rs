//! Error taxonomy for the Dataverse client
//!
//! Every variant is terminal for the operation that raised it. The only
//! recovery performed inside the library is the single retry after a 401.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataverseError {
    /// No usable credential combination, or an invalid base URL
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token exchange rejected, or a request still unauthorized after the retry
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-2xx response other than a recoverable 401
    #[error("HTTP {status_code}: {body}")]
    Api { status_code: u16, body: String },

    /// Network or transport failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request or response body is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DataverseError {
    /// Process exit code used by the command-line front end
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) | Self::Authentication(_) => 2,
            Self::Api { .. } | Self::Transport(_) | Self::Json(_) | Self::InvalidResponse(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DataverseError>;
