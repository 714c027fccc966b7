//! Configuration parsing and validation.
//!
//! Crossbar configuration is loaded from TOML files with CLI overrides.
//! The remote store address and the control socket path are fixed at startup
//! and not renegotiated at runtime.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level Crossbar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote store connection configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Administrative control channel configuration.
    #[serde(default)]
    pub control: ControlConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Remote store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Mode: "embedded" or "external".
    #[serde(default = "default_store_mode")]
    pub mode: String,

    /// Runtime directory holding the store and control sockets.
    #[serde(default = "default_rundir")]
    pub rundir: String,

    /// Explicit store socket address, overriding the rundir-derived default.
    #[serde(default)]
    pub socket: Option<String>,
}

impl StoreConfig {
    /// The remote store address, in the form `unix:<rundir>/db.sock` unless
    /// overridden.
    pub fn socket_address(&self) -> String {
        match &self.socket {
            Some(socket) => socket.clone(),
            None => format!("unix:{}/db.sock", self.rundir),
        }
    }

    /// Whether the store runs in-process.
    pub fn is_embedded(&self) -> bool {
        self.mode == "embedded"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: default_store_mode(),
            rundir: default_rundir(),
            socket: None,
        }
    }
}

/// Administrative control channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Control socket path. Defaults to `<rundir>/crossbar.ctl`.
    #[serde(default)]
    pub socket: Option<String>,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_store_mode() -> String {
    "embedded".to_string()
}

fn default_rundir() -> String {
    "/var/run/crossbar".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            control: ControlConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// The control socket path.
    pub fn control_socket(&self) -> String {
        match &self.control.socket {
            Some(socket) => socket.clone(),
            None => format!("{}/crossbar.ctl", self.store.rundir),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        match self.store.mode.as_str() {
            "embedded" | "external" => {}
            other => anyhow::bail!("invalid store mode {other:?}, expected embedded or external"),
        }
        if self.store.rundir.is_empty() {
            anyhow::bail!("store.rundir must not be empty");
        }
        match self.telemetry.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!("invalid log level {other:?}"),
        }
        Ok(())
    }
}
