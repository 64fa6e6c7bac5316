use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::geometry::OutputFormat;

/// Application configuration module
/// This module handles the run configuration including loading,
/// validating and saving configuration settings.
/// Represents the run configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Run name, used as the workspace directory under `output/`
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Identifier of the style record in the font config table
    #[serde(default = "default_font_config_id")]
    pub font_config_id: String,

    /// Path of the font config table
    #[serde(default = "default_font_config_path")]
    pub font_config_path: String,

    /// Output height, e.g. "1080p"
    #[serde(default = "default_output_resolution")]
    pub output_resolution: String,

    /// Output aspect ratio as [width, height]
    #[serde(default = "default_video_aspect_ratio")]
    pub video_aspect_ratio: [u32; 2],

    /// Line segmentation thresholds
    #[serde(default)]
    pub subtitle_config: SubtitleConfig,

    /// Seed for the highlight rotation draw; random when absent
    #[serde(default)]
    pub layout_seed: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Thresholds that close a subtitle line
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SubtitleConfig {
    /// Maximum characters of the joined line text
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Maximum summed word duration in seconds
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,

    /// Maximum silence between consecutive words in seconds
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            max_duration: default_max_duration(),
            max_gap: default_max_gap(),
        }
    }
}

impl SubtitleConfig {
    /// Reject thresholds that would make segmentation meaningless
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_chars == 0 {
            return Err(ConfigurationError::invalid(
                "subtitle_config.max_chars",
                "must be greater than zero",
            ));
        }
        if !self.max_duration.is_finite() || self.max_duration <= 0.0 {
            return Err(ConfigurationError::invalid(
                "subtitle_config.max_duration",
                format!("must be a positive number of seconds, got {}", self.max_duration),
            ));
        }
        if !self.max_gap.is_finite() || self.max_gap < 0.0 {
            return Err(ConfigurationError::invalid(
                "subtitle_config.max_gap",
                format!("must be a non-negative number of seconds, got {}", self.max_gap),
            ));
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_run_name() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn default_font_config_id() -> String {
    "1".to_string()
}

fn default_font_config_path() -> String {
    "fontConfig.json".to_string()
}

fn default_output_resolution() -> String {
    "1080p".to_string()
}

fn default_video_aspect_ratio() -> [u32; 2] {
    [9, 16]
}

fn default_max_chars() -> usize {
    30
}

fn default_max_duration() -> f64 {
    2.5
}

fn default_max_gap() -> f64 {
    1.5
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::invalid("name", "must not be empty"));
        }
        if self.font_config_id.trim().is_empty() {
            return Err(ConfigurationError::invalid("font_config_id", "must not be empty"));
        }

        self.subtitle_config.validate()?;
        self.output_format()?;

        Ok(())
    }

    /// Parsed output resolution and aspect ratio
    pub fn output_format(&self) -> Result<OutputFormat, ConfigurationError> {
        OutputFormat::parse(&self.output_resolution, self.video_aspect_ratio)
    }

    /// Load a configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigurationError::Malformed(e.to_string()))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            name: default_run_name(),
            font_config_id: default_font_config_id(),
            font_config_path: default_font_config_path(),
            output_resolution: default_output_resolution(),
            video_aspect_ratio: default_video_aspect_ratio(),
            subtitle_config: SubtitleConfig::default(),
            layout_seed: None,
            log_level: LogLevel::default(),
        }
    }
}
