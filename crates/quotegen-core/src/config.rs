//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotegen/config.toml)
//! 3. Environment variables (QUOTEGEN_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTEGEN";

/// Placeholder collection endpoint used when no sync URL is configured
pub const DEFAULT_SYNC_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Keys accepted by `Config::set`
pub const CONFIG_KEYS: &[&str] = &[
    "data_dir",
    "app_name",
    "sync_url",
    "sync_enabled",
    "sync_interval_secs",
    "sync_fetch_limit",
    "sync_category",
    "request_timeout_secs",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for durable data (quote slots, logs)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Namespace for slot keys (`<app>_quotes`, ...)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Remote quote collection URL
    #[serde(default = "default_sync_url")]
    pub sync_url: String,

    /// Whether sync is enabled
    #[serde(default)]
    pub sync_enabled: bool,

    /// Seconds between periodic syncs in the interactive shell
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Number of remote records requested per fetch (`_limit`)
    #[serde(default = "default_fetch_limit")]
    pub sync_fetch_limit: usize,

    /// Category assigned to remote records that carry none
    #[serde(default = "default_sync_category")]
    pub sync_category: String,

    /// Per-request timeout for the remote endpoint
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log file path (defaults to {data_dir}/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            app_name: default_app_name(),
            sync_url: default_sync_url(),
            sync_enabled: false,
            sync_interval_secs: default_sync_interval(),
            sync_fetch_limit: default_fetch_limit(),
            sync_category: default_sync_category(),
            request_timeout_secs: default_request_timeout(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUOTEGEN_DATA_DIR, QUOTEGEN_SYNC_URL, ...)
    /// 2. Config file (~/.config/quotegen/config.toml or QUOTEGEN_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path from the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        check_app_name(&config.app_name)?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string restores the default endpoint
        if let Ok(val) = std::env::var(format!("{}_SYNC_URL", ENV_PREFIX)) {
            self.sync_url = if val.is_empty() {
                default_sync_url()
            } else {
                val
            };
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = parse_bool(&val);
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                if secs > 0 {
                    self.sync_interval_secs = secs;
                }
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "app_name" => {
                check_app_name(value.trim())?;
                self.app_name = value.trim().to_string();
            }
            "sync_url" => {
                self.sync_url = if value.is_empty() {
                    default_sync_url()
                } else {
                    value.to_string()
                };
            }
            "sync_enabled" => self.sync_enabled = parse_bool(value),
            "sync_interval_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: '{}'", value))?;
                if secs == 0 {
                    bail!("sync_interval_secs must be greater than zero");
                }
                self.sync_interval_secs = secs;
            }
            "sync_fetch_limit" => {
                self.sync_fetch_limit = value
                    .parse()
                    .with_context(|| format!("Invalid fetch limit: '{}'", value))?;
            }
            "sync_category" => {
                if value.trim().is_empty() {
                    bail!("sync_category must not be empty");
                }
                self.sync_category = value.trim().to_string();
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: '{}'", value))?;
            }
            "log_file" => {
                self.log_file = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {
                bail!(
                    "Unknown configuration key: '{}'\nValid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                );
            }
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTEGEN_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotegen")
            .join("config.toml")
    }

    /// Directory holding the durable slot files
    pub fn durable_slot_dir(&self) -> PathBuf {
        self.data_dir.join("slots")
    }

    /// Directory holding session slot files for one-shot commands
    ///
    /// Lives under the runtime directory so it is cleared with the login
    /// session; falls back to the temp directory. The name carries a short
    /// digest of `data_dir` so two collections never share a session.
    pub fn session_slot_dir(&self) -> PathBuf {
        let digest = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            self.data_dir.to_string_lossy().as_bytes(),
        )
        .simple()
        .to_string();

        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("{}-session-{}", self.app_name, &digest[..8]))
    }

    /// Log file location
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }

    /// Periodic sync interval
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    /// Remote request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotegen")
}

/// App names become slot keys and directory names, so only characters that
/// survive as-is in a file name are accepted
fn check_app_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("app_name must not be empty");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!(
            "app_name '{}' contains '{}'; use letters, digits, '_' or '-'",
            name,
            c
        );
    }
    Ok(())
}

fn default_app_name() -> String {
    "quotegen".to_string()
}

fn default_sync_url() -> String {
    DEFAULT_SYNC_URL.to_string()
}

fn default_sync_interval() -> u64 {
    30
}

fn default_fetch_limit() -> usize {
    10
}

fn default_sync_category() -> String {
    "Server".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
