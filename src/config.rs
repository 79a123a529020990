//! Server configuration
//!
//! Loaded from a TOML file; every field has a default so an empty (or
//! missing) file yields a working configuration.
//!
//! ```toml
//! bind_addr = "0.0.0.0:5000"
//! alert_buffer = 16
//!
//! [messages]
//! min_delay_secs = 5.0
//! max_delay_secs = 20.0
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::trace;

use crate::actors::alert::DEFAULT_ALERT_BUFFER;
use crate::queue::{DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY, DEFAULT_POLL_INTERVAL, DelayRange};

/// Environment variable overriding [`Config::bind_addr`]
pub const BIND_ADDR_ENV: &str = "VITALS_BIND_ADDR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen address (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS for the dashboard (default: true)
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Buffer size of the alert worker's subscription (default: 16)
    #[serde(default = "default_alert_buffer")]
    pub alert_buffer: usize,

    /// Simulated delivery settings
    #[serde(default)]
    pub messages: MessageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    /// Lower bound of the delivery delay in seconds (default: 5)
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: f64,

    /// Upper bound of the delivery delay in seconds (default: 20)
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: f64,

    /// How long the worker waits for work between stop checks (default: 100)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_enable_cors() -> bool {
    true
}

fn default_alert_buffer() -> usize {
    DEFAULT_ALERT_BUFFER
}

fn default_min_delay() -> f64 {
    DEFAULT_MIN_DELAY.as_secs_f64()
}

fn default_max_delay() -> f64 {
    DEFAULT_MAX_DELAY.as_secs_f64()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: default_enable_cors(),
            alert_buffer: default_alert_buffer(),
            messages: MessageConfig::default(),
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl MessageConfig {
    /// Delivery delay range
    ///
    /// Fails when either bound is negative, not finite or too large for a
    /// [`Duration`].
    pub fn delay_range(&self) -> Result<DelayRange> {
        Ok(DelayRange::new(
            seconds("min_delay_secs", self.min_delay_secs)?,
            seconds("max_delay_secs", self.max_delay_secs)?,
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        self.delay_range()?;
        if self.min_delay_secs > self.max_delay_secs {
            bail!(
                "min_delay_secs ({}) exceeds max_delay_secs ({})",
                self.min_delay_secs,
                self.max_delay_secs
            );
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow!("{field} ({value}) must be a finite, non-negative number of seconds"))
}

impl Config {
    /// Load configuration from file, or use defaults if no file exists
    ///
    /// Without an explicit path, `~/.config/vitals-monitor/server.toml` is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(default_config_path);

        let config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };

        trace!("loaded config: {config:?}");
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.messages.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            self.bind_addr = addr
                .parse()
                .with_context(|| format!("{BIND_ADDR_ENV} is not a socket address: {addr}"))?;
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    let path = dirs::home_dir()?.join(".config/vitals-monitor/server.toml");
    path.exists().then_some(path)
}
