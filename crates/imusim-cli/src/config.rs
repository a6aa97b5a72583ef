//! Reads/writes `~/.imusim/config.toml`.
//!
//! Every field is optional in the file; whatever is missing falls back to the
//! reference device's constants.  `IMUSIM_*` environment variables override
//! the file.

use std::fs;
use std::path::{Path, PathBuf};

use imusim_server::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_HZ, ServerConfig};
use imusim_signal::{Profile, SignalConfig};
use imusim_types::SimError;
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "IMUSIM_CONFIG";

/// Persisted simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Frames per second per consumer.
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Fixed seed for reproducible noise.  Absent means OS entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default)]
    pub signal: SignalConfig,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_rate_hz() -> f64 {
    DEFAULT_RATE_HZ
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_hz: default_rate_hz(),
            seed: None,
            signal: SignalConfig::default(),
        }
    }
}

impl Config {
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            rate_hz: self.rate_hz,
            seed: self.seed,
            signal: self.signal.clone(),
        }
    }
}

/// `$IMUSIM_CONFIG`, or `~/.imusim/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_VAR) {
        return PathBuf::from(explicit);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".imusim").join("config.toml")
}

/// Load the config from [`config_path`].  Returns `None` if the file does
/// not exist.
pub fn load() -> Result<Option<Config>, SimError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, SimError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        SimError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw).map_err(|e| {
        SimError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
    })?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `IMUSIM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `IMUSIM_HOST` | `host` |
/// | `IMUSIM_PORT` | `port` |
/// | `IMUSIM_RATE_HZ` | `rate_hz` |
/// | `IMUSIM_PROFILE` | `signal.profile` |
/// | `IMUSIM_SEED` | `seed` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("IMUSIM_HOST") {
        cfg.host = v;
    }
    if let Some(v) = lookup("IMUSIM_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Some(v) = lookup("IMUSIM_RATE_HZ")
        && let Ok(rate) = v.parse::<f64>()
    {
        cfg.rate_hz = rate;
    }
    if let Some(v) = lookup("IMUSIM_PROFILE")
        && let Ok(profile) = v.parse::<Profile>()
    {
        cfg.signal.profile = profile;
    }
    if let Some(v) = lookup("IMUSIM_SEED")
        && let Ok(seed) = v.parse::<u64>()
    {
        cfg.seed = Some(seed);
    }
}

/// Write `cfg` to [`config_path`], creating the directory if necessary.
pub fn save(cfg: &Config) -> Result<PathBuf, SimError> {
    let path = config_path();
    save_to(cfg, &path)?;
    Ok(path)
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), SimError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SimError::InvalidConfig(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| SimError::Serialization(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(|e| {
        SimError::InvalidConfig(format!("failed to write {}: {e}", path.display()))
    })
}
