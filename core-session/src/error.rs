use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Local read or write failed on the secrets file, the token file, or a
    /// derived path. Always carries the originating path.
    #[error("filesystem error at {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The secrets file exists but does not contain a usable client key.
    #[error("unusable secret bundle at {path}: {reason}")]
    SecretBundle { path: PathBuf, reason: String },

    /// The interactive consent flow failed or was abandoned.
    #[error("consent flow failed: {0}")]
    Consent(String),

    /// The token endpoint rejected a refresh-token grant.
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    /// An operation required a credential but none was available.
    #[error("not authenticated")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, SessionError>;
