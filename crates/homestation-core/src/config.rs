//! Station configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a valid configuration. A file is loaded with [`StationConfig::load`],
//! then environment overrides are applied and the result is validated.
//!
//! ```
//! use homestation_core::StationConfig;
//!
//! let config = StationConfig::from_json_str(r#"{ "access": { "credential": "4321" } }"#).unwrap();
//! assert_eq!(config.access.credential, "4321");
//! assert_eq!(config.access.submit_key, 'A');
//! config.validate().unwrap();
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::FirmwareVariant;

/// Environment variable holding the config file path.
pub const ENV_CONFIG_PATH: &str = "HOMESTATION_CONFIG";

/// Environment variable overriding the HTTP bind address.
pub const ENV_BIND_ADDR: &str = "HOMESTATION_BIND";

/// Environment variable overriding the keypad credential.
pub const ENV_CREDENTIAL: &str = "HOMESTATION_CREDENTIAL";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Address the API listens on.
    pub bind_addr: SocketAddr,

    /// Maximum number of simultaneous connections.
    pub max_connections: usize,

    /// Directory holding `index.html`, `style.css` and `script.js`.
    pub static_dir: Option<PathBuf>,

    /// Idle time after which a keep-alive connection is closed.
    pub idle_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            static_dir: None,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl HttpConfig {
    /// Idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Keypad access check settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Code that grants access.
    pub credential: String,

    /// Key that submits the entered code.
    pub submit_key: char,

    /// Key that discards the entered code.
    pub clear_key: char,

    /// How long the outcome stays on the display.
    pub presentation_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            credential: DEFAULT_CREDENTIAL.to_string(),
            submit_key: DEFAULT_SUBMIT_KEY,
            clear_key: DEFAULT_CLEAR_KEY,
            presentation_ms: DEFAULT_PRESENTATION_MS,
        }
    }
}

impl AccessConfig {
    /// Presentation time as a [`Duration`].
    pub fn presentation(&self) -> Duration {
        Duration::from_millis(self.presentation_ms)
    }
}

/// Top-level station configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// mDNS hostname.
    pub hostname: String,

    /// Board variant.
    pub variant: FirmwareVariant,

    /// HTTP listener settings.
    pub http: HttpConfig,

    /// Keypad access settings.
    pub access: AccessConfig,

    /// Poll loop tick in milliseconds.
    pub tick_ms: u64,

    /// Interval between sensor log lines in milliseconds.
    pub sensor_log_interval_ms: u64,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            variant: FirmwareVariant::default(),
            http: HttpConfig::default(),
            access: AccessConfig::default(),
            tick_ms: DEFAULT_TICK_MS,
            sensor_log_interval_ms: DEFAULT_SENSOR_LOG_INTERVAL_MS,
            log_filter: "info".to_string(),
        }
    }
}

impl StationConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON for
    /// this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading station configuration");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.http.bind_addr = addr
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_BIND_ADDR}: invalid address '{addr}'")))?;
            debug!(bind_addr = %self.http.bind_addr, "Bind address overridden from environment");
        }

        if let Some(credential) = lookup(ENV_CREDENTIAL) {
            self.access.credential = credential;
            debug!("Credential overridden from environment");
        }

        Ok(())
    }

    /// Check the configuration for values the station cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - The credential is empty
    /// - The submit and clear keys are the same key
    /// - The credential contains a reserved key (it could never be typed)
    /// - The tick or the HTTP idle timeout is zero
    pub fn validate(&self) -> Result<()> {
        let access = &self.access;

        if access.credential.is_empty() {
            return Err(Error::Config("access.credential must not be empty".into()));
        }

        if access.submit_key == access.clear_key {
            return Err(Error::Config(format!(
                "access.submit_key and access.clear_key are both '{}'",
                access.submit_key
            )));
        }

        if let Some(key) = access
            .credential
            .chars()
            .find(|&c| c == access.submit_key || c == access.clear_key)
        {
            return Err(Error::Config(format!(
                "access.credential contains reserved key '{key}'"
            )));
        }

        if self.tick_ms == 0 {
            return Err(Error::Config("tick_ms must be greater than zero".into()));
        }

        if self.http.idle_timeout_ms == 0 {
            return Err(Error::Config(
                "http.idle_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Poll loop tick as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Sensor log interval as a [`Duration`].
    pub fn sensor_log_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_log_interval_ms)
    }
}
