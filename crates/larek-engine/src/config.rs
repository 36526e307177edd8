//! # Storefront Configuration
//!
//! Configuration management for the storefront engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LAREK_API_ORIGIN=https://staging.example                           │
//! │     LAREK_LOG_EVENTS=true                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/larek/larek.toml (Linux)                                 │
//! │     ~/Library/Application Support/dev.larek.storefront/larek.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! origin = "https://larek-api.nomoreparties.co"
//! product_path = "/api/weblarek/product"
//! cdn_path = "/content/weblarek"
//! timeout_secs = 10
//!
//! [bus]
//! history_capacity = 1000
//! log_events = false
//!
//! [commands]
//! history_capacity = 100
//!
//! [notifications]
//! info_ms = 3000
//! error_ms = 5000
//! system_error_ms = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Scheme and host of the storefront API.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path of the product list endpoint.
    #[serde(default = "default_product_path")]
    pub product_path: String,

    /// Path prefix of product images on the CDN.
    #[serde(default = "default_cdn_path")]
    pub cdn_path: String,

    /// Request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_origin() -> String {
    "https://larek-api.nomoreparties.co".to_string()
}

fn default_product_path() -> String {
    "/api/weblarek/product".to_string()
}

fn default_cdn_path() -> String {
    "/content/weblarek".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            origin: default_origin(),
            product_path: default_product_path(),
            cdn_path: default_cdn_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiSettings {
    /// Full URL of the product list.
    pub fn product_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.product_path)
    }

    /// Prefix joined in front of relative image paths.
    pub fn cdn_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.cdn_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Bus Settings
// =============================================================================

/// Event bus settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Maximum number of records kept in the event history.
    #[serde(default = "default_bus_history")]
    pub history_capacity: usize,

    /// Installs the logging middleware.
    #[serde(default)]
    pub log_events: bool,
}

fn default_bus_history() -> usize {
    1000
}

impl Default for BusSettings {
    fn default() -> Self {
        BusSettings {
            history_capacity: default_bus_history(),
            log_events: false,
        }
    }
}

// =============================================================================
// Command Settings
// =============================================================================

/// Undo/redo history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSettings {
    /// Maximum number of undoable commands.
    #[serde(default = "default_command_history")]
    pub history_capacity: usize,
}

fn default_command_history() -> usize {
    100
}

impl Default for CommandSettings {
    fn default() -> Self {
        CommandSettings {
            history_capacity: default_command_history(),
        }
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

/// Auto-dismiss delays of the notifications the engine posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Success and info toasts (basket changes).
    #[serde(default = "default_info_ms")]
    pub info_ms: u32,

    /// Failed user actions and catalog errors.
    #[serde(default = "default_error_ms")]
    pub error_ms: u32,

    /// Toasts raised from the system `error` event.
    #[serde(default = "default_system_error_ms")]
    pub system_error_ms: u32,
}

fn default_info_ms() -> u32 {
    3000
}

fn default_error_ms() -> u32 {
    5000
}

fn default_system_error_ms() -> u32 {
    10_000
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            info_ms: default_info_ms(),
            error_ms: default_error_ms(),
            system_error_ms: default_system_error_ms(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete storefront configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub bus: BusSettings,

    #[serde(default)]
    pub commands: CommandSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl StorefrontConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (larek.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load storefront config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document; missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let origin = &self.api.origin;
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api.origin must start with http:// or https://, got: {}",
                origin
            )));
        }

        if !self.api.product_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "api.product_path must start with '/'".into(),
            ));
        }

        if self.bus.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bus.history_capacity must be greater than 0".into(),
            ));
        }

        if self.commands.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "commands.history_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(origin) = std::env::var("LAREK_API_ORIGIN") {
            debug!(origin = %origin, "Overriding API origin from environment");
            self.api.origin = origin;
        }

        if let Ok(capacity) = std::env::var("LAREK_BUS_HISTORY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.bus.history_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring non-numeric LAREK_BUS_HISTORY"),
            }
        }

        if let Ok(capacity) = std::env::var("LAREK_COMMAND_HISTORY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.commands.history_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring non-numeric LAREK_COMMAND_HISTORY"),
            }
        }

        if let Ok(flag) = std::env::var("LAREK_LOG_EVENTS") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.bus.log_events = true,
                "0" | "false" | "no" | "off" => self.bus.log_events = false,
                _ => warn!(value = %flag, "Unknown LAREK_LOG_EVENTS value"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "larek", "storefront")
            .map(|dirs| dirs.config_dir().join("larek.toml"))
    }
}
