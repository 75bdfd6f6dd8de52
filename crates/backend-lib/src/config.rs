// ============================
// talentlobby-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `TALENTLOBBY_BIND_ADDR`
pub const ENV_PREFIX: &str = "TALENTLOBBY_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory for the flat-file lobby store
    pub data_dir: PathBuf,
    /// Default log filter, `RUST_LOG` wins when set
    pub log_level: String,
    pub log_format: LogFormat,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// How often expired sessions are purged
    pub session_cleanup_secs: u64,
    pub rate_limit: RateLimitSettings,
    /// Allowed CORS origin; `None` allows any origin
    pub cors_allow_origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Fixed-window HTTP rate limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            session_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            session_cleanup_secs: 15 * 60,
            rate_limit: RateLimitSettings::default(),
            cors_allow_origin: None,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `config.toml` in the working directory and the environment
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment().merge(Toml::file("config.toml")))
    }

    /// Load settings using an explicit TOML file; the file must exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        Self::from_figment(Self::figment().merge(Toml::file(path)))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be greater than zero");
        }
        if self.session_cleanup_secs == 0 {
            bail!("session_cleanup_secs must be greater than zero");
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate_limit values must be greater than zero");
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.session_cleanup_secs)
    }
}
