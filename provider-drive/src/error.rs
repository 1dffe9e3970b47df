//! Error types for the Drive provider.

use core_session::SessionError;
use std::path::PathBuf;
use thiserror::Error;

/// Drive provider errors.
///
/// Transfer failures are split by where they happened so callers can tell a
/// rejected request (`Api`) from a broken byte stream (`Stream`) from a local
/// write failure (`Sink`).
#[derive(Error, Debug)]
pub enum DriveError {
    /// Establishing a sub-client failed after (or during) authorization.
    #[error("failed to connect {client} client: {reason}")]
    Connection { client: &'static str, reason: String },

    /// The remote provider rejected or never answered a call. `status` is
    /// absent when the request failed below the HTTP layer.
    #[error("drive api error: {message}")]
    Api { status: Option<u16>, message: String },

    /// The byte stream failed after a transfer had begun.
    #[error("transfer stream failed: {0}")]
    Stream(String),

    /// The local destination rejected a write.
    #[error("failed writing {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider answered with something undecodable.
    #[error("failed to parse api response: {0}")]
    Parse(String),

    /// Credential lifecycle failure.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl DriveError {
    /// Map a transport-layer failure onto the API error variant, keeping the
    /// status when one was observed.
    pub(crate) fn from_transport(error: core_session::HttpError) -> Self {
        match error {
            core_session::HttpError::Status { status, message } => DriveError::Api {
                status: Some(status),
                message,
            },
            other => DriveError::Api {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;
