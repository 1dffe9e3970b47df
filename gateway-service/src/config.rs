//! Environment-derived gateway configuration.
//!
//! All session settings are read once at startup; a missing required
//! variable is a fatal startup error with an actionable message.

use anyhow::{bail, Context};
use core_session::SessionConfig;
use std::net::SocketAddr;

/// Required: comma-separated OAuth scope list.
const ENV_SCOPES: &str = "GOOGLE_SCOPES";
/// Required: directory holding `credentials.json`; receives `token.json`.
const ENV_SECRETS_DIR: &str = "SECRETS_DIR";
/// Required: assets root; receives `downloads/` and `exports/`.
const ENV_ASSETS_DIR: &str = "ASSETS_DIR";
/// Optional listen address.
const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub session: SessionConfig,
}

impl GatewayConfig {
    /// Build the configuration from process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let scopes_raw = require(ENV_SCOPES)?;
        let scopes: Vec<String> = scopes_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if scopes.is_empty() {
            bail!("{ENV_SCOPES} must contain at least one OAuth scope");
        }

        let secrets_dir = require(ENV_SECRETS_DIR)?;
        let assets_dir = require(ENV_ASSETS_DIR)?;

        let listen_addr = std::env::var(ENV_LISTEN_ADDR)
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("{ENV_LISTEN_ADDR} is not a valid socket address"))?;

        Ok(Self {
            listen_addr,
            session: SessionConfig::new(scopes, secrets_dir, assets_dir),
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("required environment variable {name} is not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate process environment so they cannot race
    /// when run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for name in [ENV_SCOPES, ENV_SECRETS_DIR, ENV_ASSETS_DIR, ENV_LISTEN_ADDR] {
            std::env::remove_var(name);
        }
    }

    fn set_required() {
        std::env::set_var(ENV_SCOPES, "https://www.googleapis.com/auth/drive");
        std::env::set_var(ENV_SECRETS_DIR, "/srv/gateway/secrets");
        std::env::set_var(ENV_ASSETS_DIR, "/srv/gateway/assets");
    }

    #[test]
    fn builds_from_complete_environment() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.session.scopes.len(), 1);
        assert!(config.session.token_path.ends_with("token.json"));
        assert!(config.session.downloads_dir.ends_with("downloads"));

        clear_env();
    }

    #[test]
    fn splits_and_trims_scope_list() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_SCOPES, "scope-a, scope-b ,,scope-c");

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(
            config.session.scopes,
            vec!["scope-a", "scope-b", "scope-c"]
        );

        clear_env();
    }

    #[test]
    fn missing_required_variable_is_fatal() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        std::env::remove_var(ENV_ASSETS_DIR);

        let error = GatewayConfig::from_env().unwrap_err();
        assert!(error.to_string().contains(ENV_ASSETS_DIR));

        clear_env();
    }

    #[test]
    fn empty_scope_list_is_fatal() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_SCOPES, " , ");

        assert!(GatewayConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn custom_listen_addr_is_honored() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_LISTEN_ADDR, "0.0.0.0:8088");

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.listen_addr.port(), 8088);

        clear_env();
    }

    #[test]
    fn invalid_listen_addr_is_fatal() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_LISTEN_ADDR, "not-an-address");

        assert!(GatewayConfig::from_env().is_err());

        clear_env();
    }
}
