//! Environment variable loading and management.
//!
//! Environment variables override values from the TOML configuration and
//! carry the host's platform flag for native composition roots.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use super::config::Configuration;

/// Marks the host as constrained (`1`/`true`/`yes`/`on`)
pub const CONSTRAINED_HOST_VAR: &str = "HUBSTORE_CONSTRAINED_HOST";
/// Overrides `logging.log_level`
pub const LOG_LEVEL_VAR: &str = "HUBSTORE_LOG_LEVEL";
/// Overrides `selection.handshake_timeout_ms`
pub const HANDSHAKE_TIMEOUT_VAR: &str = "HUBSTORE_HANDSHAKE_TIMEOUT_MS";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
    vars: Option<HashMap<String, String>>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicit path is loaded.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file.filter(|p| p.exists()) {
            if let Err(e) = dotenv::from_path(path) {
                tracing::warn!("Failed to load .env file {}: {}", path.display(), e);
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
            vars: None,
        }
    }

    /// Loader reading from `vars` instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env_file: None,
            vars: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => env::var(name).ok(),
        }
    }

    /// The .env file this loader was created with
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Platform flag for constrained hosts, if set
    pub fn constrained_host(&self) -> Option<bool> {
        self.var(CONSTRAINED_HOST_VAR).and_then(|v| parse_flag(&v))
    }

    /// Log level override, if set
    pub fn log_level(&self) -> Option<String> {
        self.var(LOG_LEVEL_VAR).filter(|v| !v.trim().is_empty())
    }

    /// Handshake timeout override in milliseconds, if set and numeric
    pub fn handshake_timeout_ms(&self) -> Option<u64> {
        self.var(HANDSHAKE_TIMEOUT_VAR)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Overlay environment overrides onto `config`.
    pub fn apply(&self, config: &mut Configuration) {
        if let Some(level) = self.log_level() {
            config.logging.log_level = level;
        }
        if let Some(timeout) = self.handshake_timeout_ms() {
            config.selection.handshake_timeout_ms = Some(timeout);
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
