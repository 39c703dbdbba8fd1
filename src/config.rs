//! Configuration for preview-deck
//!
//! Minimal TOML bootstrap: port, logging, fade/toast tuning, and the preview
//! track list. Values omitted from the file fall back to built-in defaults;
//! the CLI layer (`main.rs`) may override the port. Settings cannot change
//! while running.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Bootstrap configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub fade: FadeConfig,

    #[serde(default)]
    pub toast: ToastConfig,

    /// Control emphasis pulse length in milliseconds
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,

    /// Preview tracks registered at startup
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
            fade: FadeConfig::default(),
            toast: ToastConfig::default(),
            pulse_ms: default_pulse_ms(),
            tracks: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Volume ramp-down tuning
#[derive(Debug, Clone, Deserialize)]
pub struct FadeConfig {
    /// Full-volume-to-silence ramp length in milliseconds
    #[serde(default = "default_fade_duration_ms")]
    pub duration_ms: u64,

    /// Number of equal level steps across the ramp
    #[serde(default = "default_fade_steps")]
    pub steps: u32,

    /// Near-zero level at or below which the fade finalizes
    #[serde(default = "default_fade_floor")]
    pub floor: f32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_fade_duration_ms(),
            steps: default_fade_steps(),
            floor: default_fade_floor(),
        }
    }
}

/// Toast presenter tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ToastConfig {
    /// Auto-dismiss delay in milliseconds
    #[serde(default = "default_toast_dismiss_ms")]
    pub dismiss_after_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_toast_dismiss_ms(),
        }
    }
}

/// One preview track definition
#[derive(Debug, Clone, Deserialize)]
pub struct TrackEntry {
    /// Display title; the control slug is derived from it
    pub title: String,

    /// Simulated track length in milliseconds
    pub duration_ms: u64,

    /// Hosting URL for the download affordance
    #[serde(default)]
    pub download_url: Option<String>,

    /// Simulated playback-start latency in milliseconds
    #[serde(default)]
    pub start_delay_ms: u64,
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fade_duration_ms() -> u64 {
    1000
}

fn default_fade_steps() -> u32 {
    20
}

fn default_fade_floor() -> f32 {
    0.05
}

fn default_toast_dismiss_ms() -> u64 {
    3000
}

fn default_pulse_ms() -> u64 {
    400
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tunings that would make the fade degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.fade.steps == 0 {
            return Err(Error::Config("fade.steps must be at least 1".into()));
        }
        if self.fade.duration_ms == 0 {
            return Err(Error::Config("fade.duration_ms must be nonzero".into()));
        }
        if !(0.0..1.0).contains(&self.fade.floor) {
            return Err(Error::Config("fade.floor must be in [0.0, 1.0)".into()));
        }
        Ok(())
    }
}
