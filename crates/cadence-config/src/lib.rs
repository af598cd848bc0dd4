//! Cadence configuration system
//!
//! Loads engine, playback and logging settings from `cadence.toml`, with
//! environment variables taking precedence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CadenceConfig {
    /// Timeline construction and validation
    pub engine: EngineConfig,
    /// Demo playback loop
    pub playback: PlaybackConfig,
    pub logging: LoggingConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Easing name used when a timeline does not specify one
    pub default_easing: String,
    /// Treat keyframes with missing properties as an error
    pub strict_properties: bool,
    /// Run deep validation after loading a timeline
    pub verify_on_load: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Time units between ticks
    pub frame_interval: u64,
    /// Upper bound on ticks per run
    pub max_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `cadence_engine=debug`
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Timeline JSON to play; a built-in sample is used when absent
    pub timeline: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_easing: "linear".to_string(),
            strict_properties: false,
            verify_on_load: true,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval: 16, // ~60 ticks per 1000 units
            max_frames: 240,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            timeline: Some(PathBuf::from("timeline.json")),
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl CadenceConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `cadence.toml` from the current directory, or defaults if it is
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_else(|err| {
            if let ConfigError::Parse { .. } = err {
                tracing::warn!(%err, "using default configuration");
            }
            Self::default()
        })
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    /// Unparseable numbers are ignored.
    pub fn merge_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Engine settings
        if let Some(easing) = lookup("CADENCE_DEFAULT_EASING") {
            self.engine.default_easing = easing;
        }
        if let Some(val) = lookup("CADENCE_STRICT_PROPERTIES") {
            self.engine.strict_properties = parse_flag(&val);
        }
        if let Some(val) = lookup("CADENCE_VERIFY_ON_LOAD") {
            self.engine.verify_on_load = parse_flag(&val);
        }

        // Playback settings
        if let Some(interval) = lookup("CADENCE_FRAME_INTERVAL").and_then(|v| v.parse().ok()) {
            self.playback.frame_interval = interval;
        }
        if let Some(frames) = lookup("CADENCE_MAX_FRAMES").and_then(|v| v.parse().ok()) {
            self.playback.max_frames = frames;
        }

        if let Some(filter) = lookup("CADENCE_LOG") {
            self.logging.filter = filter;
        }
        if let Some(path) = lookup("CADENCE_TIMELINE") {
            self.demo.timeline = Some(PathBuf::from(path));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from cadence.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
