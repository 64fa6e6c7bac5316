/*!
 * Caption style records.
 *
 * A font config table maps an identifier to one style record. The table is
 * loaded once per run and every record is shared read-only by all lines.
 *
 * Pixel sizes are derived from the frame height: the base size is
 * `floor(frame_height * font_size_factor)` and each style group scales it by
 * its own `font_size_factor`.
 */

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::measure::TextStyle;

/// RGB color triple
pub type Rgb = [u8; 3];

/// Style for the regular (non-highlighted) word text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyleConfig {
    pub font: String,
    pub font_size_factor: f64,
    pub color: String,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub stroke_width: f64,
}

/// Rounded box drawn behind a highlighted word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightBoxConfig {
    /// Corner radius in pixels
    pub radius: f64,
    pub color: Rgb,
    pub opacity: f64,
}

/// Style for the animated highlight of each word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyleConfig {
    pub font: String,
    pub font_size_factor: f64,
    pub color: String,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub stroke_width: f64,
    /// Maximum absolute rotation jitter in degrees
    #[serde(default)]
    pub rotate_random_degree: f64,
    #[serde(rename = "back_ground_color_clip")]
    pub highlight_box: HighlightBoxConfig,
}

/// Style of the glyph measured between words
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingStyleConfig {
    #[serde(default = "default_spacing_text")]
    pub text: String,
    /// Falls back to the normal font when absent
    #[serde(default)]
    pub font: Option<String>,
    pub font_size_factor: f64,
    pub color: String,
}

/// Box drawn behind the whole line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub color: Rgb,
    pub opacity: f64,
    pub size_factor: f64,
}

/// One complete caption style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default = "default_font_size_factor")]
    pub font_size_factor: f64,
    /// Reveal words progressively instead of showing the full line at once
    #[serde(default)]
    pub words_on_the_go: bool,
    /// Distance of the caption block from the bottom edge, relative to frame height
    #[serde(default)]
    pub bottom_offset_factor: f64,
    pub normal: TextStyleConfig,
    pub highlighted: HighlightStyleConfig,
    pub spacing: SpacingStyleConfig,
    pub background: BackgroundConfig,
}

fn default_spacing_text() -> String {
    " ".to_string()
}

fn default_font_size_factor() -> f64 {
    1.0
}

impl FontConfig {
    /// Base font size in pixels for a frame height
    pub fn base_font_size(&self, frame_height: u32) -> f64 {
        (f64::from(frame_height) * self.font_size_factor).floor()
    }

    pub fn normal_style(&self, base_font_size: f64) -> TextStyle {
        TextStyle {
            font: self.normal.font.clone(),
            font_size: base_font_size * self.normal.font_size_factor,
            color: self.normal.color.clone(),
            stroke_color: self.normal.stroke_color.clone(),
            stroke_width: self.normal.stroke_width,
        }
    }

    pub fn highlighted_style(&self, base_font_size: f64) -> TextStyle {
        TextStyle {
            font: self.highlighted.font.clone(),
            font_size: base_font_size * self.highlighted.font_size_factor,
            color: self.highlighted.color.clone(),
            stroke_color: self.highlighted.stroke_color.clone(),
            stroke_width: self.highlighted.stroke_width,
        }
    }

    pub fn spacing_style(&self, base_font_size: f64) -> TextStyle {
        TextStyle {
            font: self.spacing.font.clone().unwrap_or_else(|| self.normal.font.clone()),
            font_size: base_font_size * self.spacing.font_size_factor,
            color: self.spacing.color.clone(),
            stroke_color: None,
            stroke_width: 0.0,
        }
    }

    /// Validate ranges of every numeric knob
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("font_size_factor", self.font_size_factor)?;
        check_positive("normal.font_size_factor", self.normal.font_size_factor)?;
        check_positive("highlighted.font_size_factor", self.highlighted.font_size_factor)?;
        check_positive("spacing.font_size_factor", self.spacing.font_size_factor)?;
        check_positive("background.size_factor", self.background.size_factor)?;

        check_non_negative("normal.stroke_width", self.normal.stroke_width)?;
        check_non_negative("highlighted.stroke_width", self.highlighted.stroke_width)?;
        check_non_negative("highlighted.rotate_random_degree", self.highlighted.rotate_random_degree)?;
        check_non_negative("highlighted.back_ground_color_clip.radius", self.highlighted.highlight_box.radius)?;
        check_non_negative("bottom_offset_factor", self.bottom_offset_factor)?;

        check_opacity("highlighted.back_ground_color_clip.opacity", self.highlighted.highlight_box.opacity)?;
        check_opacity("background.opacity", self.background.opacity)?;

        Ok(())
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigurationError::invalid(field, format!("must be positive, got {}", value)));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigurationError::invalid(field, format!("must not be negative, got {}", value)));
    }
    Ok(())
}

fn check_opacity(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::invalid(field, format!("must be within [0, 1], got {}", value)));
    }
    Ok(())
}

/// Style records keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontConfigTable {
    configs: HashMap<String, FontConfig>,
}

impl FontConfigTable {
    /// Parse and validate a table from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let table: FontConfigTable =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Malformed(e.to_string()))?;

        for (id, config) in &table.configs {
            config.validate().map_err(|e| match e {
                ConfigurationError::InvalidValue { field, reason } => ConfigurationError::InvalidValue {
                    field: format!("{}.{}", id, field),
                    reason,
                },
                other => other,
            })?;
        }

        debug!("Loaded {} font config(s)", table.configs.len());
        Ok(table)
    }

    /// Load a table from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    pub fn insert(&mut self, id: impl Into<String>, config: FontConfig) {
        self.configs.insert(id.into(), config);
    }

    /// Resolve a style record by identifier
    pub fn get(&self, id: &str) -> Result<&FontConfig, ConfigurationError> {
        self.configs
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownFontConfig(id.to_string()))
    }

    /// Sorted identifiers
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
