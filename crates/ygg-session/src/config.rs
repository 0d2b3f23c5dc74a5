//! Authentication server configuration.
//!
//! Settings are read from `~/.config/ygg-session/config.json` when present,
//! then overridden by `YGG_AUTH_HOST`, `YGG_CLIENT_TOKEN`,
//! `YGG_TIMEOUT_SECS` and `YGG_PROXY`. Only server settings live here;
//! tokens are never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{DEFAULT_TIMEOUT_SECS, YGG_PROD};
use crate::SessionError;

/// Application name used for the config directory path
const APP_NAME: &str = "ygg-session";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_AUTH_HOST: &str = "YGG_AUTH_HOST";
const ENV_CLIENT_TOKEN: &str = "YGG_CLIENT_TOKEN";
const ENV_TIMEOUT_SECS: &str = "YGG_TIMEOUT_SECS";
const ENV_PROXY: &str = "YGG_PROXY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub auth_host: String,
    pub client_token: String,
    pub request_timeout_secs: u64,
    pub proxy: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_host: YGG_PROD.to_string(),
            client_token: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

impl AuthConfig {
    /// Load from the default config path, then apply environment overrides
    pub fn load() -> Result<Self, SessionError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, SessionError> {
        debug!(path = %path.display(), "Loading auth config");
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_json::from_str(&contents).map_err(|e| {
            SessionError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.normalize();
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_AUTH_HOST) {
            self.auth_host = host;
        }
        if let Some(token) = lookup(ENV_CLIENT_TOKEN) {
            self.client_token = token;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                SessionError::Configuration(format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))
            })?;
        }
        if let Some(proxy) = lookup(ENV_PROXY) {
            self.proxy = Some(proxy);
        }
        self.normalize();
        Ok(())
    }

    /// A blank proxy means a direct connection.
    fn normalize(&mut self) {
        if self.proxy.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.proxy = None;
        }
    }

    /// Reject settings the transport cannot be built from.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.request_timeout_secs == 0 {
            return Err(SessionError::Configuration(
                "Request timeout must be at least one second".into(),
            ));
        }
        if let Some(proxy) = self.proxy.as_deref() {
            reqwest::Proxy::all(proxy).map_err(|e| {
                SessionError::Configuration(format!("Invalid proxy {}: {}", proxy, e))
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
