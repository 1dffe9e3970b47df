//! Immutable session configuration.
//!
//! Built once at process start from the environment and passed into
//! constructors, so no component reads process-wide state from inside a
//! method.

use std::path::PathBuf;

/// Paths and scopes the session layer operates on. Immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// OAuth scopes requested during consent.
    pub scopes: Vec<String>,
    /// Directory holding the secrets file; also receives the token file.
    pub secrets_dir: PathBuf,
    /// Provider-issued secrets file (`credentials.json`).
    pub secrets_path: PathBuf,
    /// Persisted authorized-user credential (`token.json`).
    pub token_path: PathBuf,
    /// Destination directory for raw downloads.
    pub downloads_dir: PathBuf,
    /// Destination directory for format-converted exports.
    pub exports_dir: PathBuf,
}

impl SessionConfig {
    /// Derive the full path layout from the two configured roots.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_session::SessionConfig;
    ///
    /// let config = SessionConfig::new(
    ///     vec!["https://www.googleapis.com/auth/drive".to_string()],
    ///     "/srv/gateway/secrets",
    ///     "/srv/gateway/assets",
    /// );
    /// assert!(config.token_path.ends_with("token.json"));
    /// assert!(config.downloads_dir.ends_with("downloads"));
    /// ```
    pub fn new(
        scopes: Vec<String>,
        secrets_dir: impl Into<PathBuf>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        let secrets_dir = secrets_dir.into();
        let assets_dir = assets_dir.into();
        Self {
            scopes,
            secrets_path: secrets_dir.join("credentials.json"),
            token_path: secrets_dir.join("token.json"),
            secrets_dir,
            downloads_dir: assets_dir.join("downloads"),
            exports_dir: assets_dir.join("exports"),
        }
    }
}
