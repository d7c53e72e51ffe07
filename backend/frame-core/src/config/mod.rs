//! Engine configuration.
//!
//! Persisted as `config.json` in a caller-chosen directory. Every section has
//! serde defaults, so a partial file (or none at all) still yields a usable
//! configuration. Environment overrides are applied on top by the host.

use crate::error::config::ConfigError;
use crate::{DEFAULT_CONTROL_PORT, DEFAULT_WAKE_PORT, THUMBNAIL_DIR_NAME};

use common::ErrorLocation;

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

const ENV_HOST: &str = "FRAME_HOST";
const ENV_MAC: &str = "FRAME_MAC";
const ENV_CLIENT_NAME: &str = "FRAME_CLIENT_NAME";

const MAX_TIMEOUT_SECS: u64 = 600;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            mac_address: String::new(),
            client_name: default_client_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    #[serde(default = "default_control_port")]
    pub rest_port: u16,
    #[serde(default = "default_control_port")]
    pub channel_port: u16,
    #[serde(default = "default_wake_port")]
    pub wake_port: u16,
    #[serde(default = "default_wake_broadcast")]
    pub wake_broadcast: Ipv4Addr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rest_port: default_control_port(),
            channel_port: default_control_port(),
            wake_port: default_wake_port(),
            wake_broadcast: default_wake_broadcast(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// REST discovery request timeout.
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
    /// WebSocket and transfer TCP connect timeout.
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,
    /// Max idle time between two reads of a thumbnail download.
    #[serde(default = "default_transfer_read_secs")]
    pub transfer_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            connect_secs: default_connect_secs(),
            transfer_read_secs: default_transfer_read_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferConfig {
    /// Where thumbnails are written. `None` means `<temp>/frame-remote`.
    #[serde(default)]
    pub thumbnail_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            target: TargetConfig::default(),
            network: NetworkConfig::default(),
            timeouts: TimeoutConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_client_name() -> String {
    "FrameRemote".to_string()
}
fn default_control_port() -> u16 {
    DEFAULT_CONTROL_PORT
}
fn default_wake_port() -> u16 {
    DEFAULT_WAKE_PORT
}
fn default_wake_broadcast() -> Ipv4Addr {
    Ipv4Addr::BROADCAST
}
fn default_request_secs() -> u64 {
    10
}
fn default_connect_secs() -> u64 {
    10
}
fn default_transfer_read_secs() -> u64 {
    30
}

// ============================================
// IMPLEMENTATION
// ============================================

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn transfer_read(&self) -> Duration {
        Duration::from_secs(self.transfer_read_secs)
    }
}

impl NetworkConfig {
    /// Destination of the wake datagram.
    pub fn wake_target(&self) -> SocketAddr {
        SocketAddr::from((self.wake_broadcast, self.wake_port))
    }
}

impl TransferConfig {
    pub fn resolved_thumbnail_dir(&self) -> PathBuf {
        self.thumbnail_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(THUMBNAIL_DIR_NAME))
    }
}

impl EngineConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: EngineConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Overlay `FRAME_HOST`, `FRAME_MAC` and `FRAME_CLIENT_NAME` from the
    /// process environment. Empty variables are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = non_empty_var(ENV_HOST) {
            info!("Using {ENV_HOST} override: {host}");
            self.target.host = host;
        }
        if let Some(mac) = non_empty_var(ENV_MAC) {
            info!("Using {ENV_MAC} override");
            self.target.mac_address = mac;
        }
        if let Some(name) = non_empty_var(ENV_CLIENT_NAME) {
            info!("Using {ENV_CLIENT_NAME} override: {name}");
            self.target.client_name = name;
        }
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation_error(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        if self.target.client_name.trim().is_empty() {
            return Err(validation_error("client_name cannot be empty"));
        }

        if self.target.host.contains('/') || self.target.host.contains(' ') {
            return Err(validation_error(format!(
                "Invalid host: '{}' (expected a bare host name or IP)",
                self.target.host
            )));
        }

        for (name, port) in [
            ("rest_port", self.network.rest_port),
            ("channel_port", self.network.channel_port),
            ("wake_port", self.network.wake_port),
        ] {
            if port == 0 {
                return Err(validation_error(format!("{name} cannot be 0")));
            }
        }

        for (name, secs) in [
            ("request_secs", self.timeouts.request_secs),
            ("connect_secs", self.timeouts.connect_secs),
            ("transfer_read_secs", self.timeouts.transfer_read_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(validation_error(format!(
                    "Invalid {name}: {secs} (must be 1-{MAX_TIMEOUT_SECS})"
                )));
            }
        }

        Ok(())
    }
}

#[track_caller]
fn validation_error(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: reason.into(),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
