use anyhow::{Context, Result};
use reconcile::WaitConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("kctl"))
}

/// Get the default config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

// ============================================================================
// Config File
// ============================================================================

/// Contents of `config.toml`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Option<String>,
    pub namespace: Option<String>,
    pub token: Option<String>,
    pub wait: WaitSettings,
}

/// `[wait]` table: deletion confirmation polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    /// Delay between existence checks, e.g. "1s"
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Timeout when `--timeout` is not given, e.g. "5m"
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,
    pub backoff_factor: f64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        let wait = WaitConfig::default();
        Self {
            interval: wait.interval,
            default_timeout: wait.default_timeout,
            backoff_factor: wait.backoff_factor,
        }
    }
}

impl WaitSettings {
    pub fn to_wait_config(&self) -> WaitConfig {
        let defaults = WaitConfig::default();
        WaitConfig {
            interval: if self.interval.is_zero() {
                defaults.interval
            } else {
                self.interval
            },
            default_timeout: if self.default_timeout.is_zero() {
                defaults.default_timeout
            } else {
                self.default_timeout
            },
            backoff_factor: if self.backoff_factor >= 1.0 {
                self.backoff_factor
            } else {
                1.0
            },
            ..defaults
        }
    }
}

impl Config {
    /// Load the config file.
    ///
    /// Without an explicit path, a missing default file yields defaults. An
    /// explicitly named file must exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (PathBuf::from(shellexpand::tilde(p).as_ref()), true),
            None => (config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge command-line values over file values and defaults
    pub fn connection(
        &self,
        server: Option<&str>,
        namespace: Option<&str>,
        token: Option<&str>,
    ) -> Connection {
        Connection {
            server: server
                .or(self.server.as_deref())
                .unwrap_or(DEFAULT_SERVER)
                .to_string(),
            namespace: namespace
                .or(self.namespace.as_deref())
                .unwrap_or(DEFAULT_NAMESPACE)
                .to_string(),
            enforce_namespace: namespace.is_some(),
            token: token.or(self.token.as_deref()).map(str::to_string),
        }
    }
}

/// Resolved API server connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub server: String,
    pub namespace: String,
    /// The namespace was given explicitly, so manifests may not override it
    pub enforce_namespace: bool,
    pub token: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
