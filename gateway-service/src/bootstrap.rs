//! Filesystem bootstrap.

use anyhow::Context;
use core_session::SessionConfig;
use tracing::debug;

/// Create the directory layout the session layer expects. Idempotent: an
/// already-populated tree is left untouched.
pub async fn ensure_layout(config: &SessionConfig) -> anyhow::Result<()> {
    for dir in [
        &config.secrets_dir,
        &config.downloads_dir,
        &config.exports_dir,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        debug!(path = %dir.display(), "directory ready");
    }
    Ok(())
}
