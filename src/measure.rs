/*!
 * Text measurement capability.
 *
 * Layout needs the rendered size of each word, but rendering belongs to the
 * compositor. The compositor exposes sizing through `TextMeasurer`; layout
 * depends only on this trait.
 *
 * - `CachingMeasurer` memoizes any measurer per (text, style)
 * - `ApproximateMeasurer` estimates sizes from glyph advance ratios when no
 *   renderer is attached
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::MeasurementError;

/// Resolved text style handed to a measurer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: String,
    /// Font size in pixels
    pub font_size: f64,
    pub color: String,
    pub stroke_color: Option<String>,
    pub stroke_width: f64,
}

/// Measured size of rendered text in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

impl TextExtent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Sizes text as the renderer would draw it
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError>;
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for &M {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError> {
        (**self).measure(text, style)
    }
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for Arc<M> {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError> {
        (**self).measure(text, style)
    }
}

/// Reject extents a renderer should never report
pub(crate) fn checked_extent(text: &str, extent: TextExtent) -> Result<TextExtent, MeasurementError> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if valid(extent.width) && valid(extent.height) {
        Ok(extent)
    } else {
        Err(MeasurementError::InvalidExtent {
            text: text.to_string(),
            width: extent.width,
            height: extent.height,
        })
    }
}

/// Cache key combining the text with the whole style
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeasureKey {
    text: String,
    font: String,
    font_size_bits: u64,
    color: String,
    stroke_width_bits: u64,
    stroke_color: Option<String>,
}

impl MeasureKey {
    fn new(text: &str, style: &TextStyle) -> Self {
        Self {
            text: text.to_string(),
            font: style.font.clone(),
            font_size_bits: style.font_size.to_bits(),
            color: style.color.clone(),
            stroke_width_bits: style.stroke_width.to_bits(),
            stroke_color: style.stroke_color.clone(),
        }
    }
}

/// Memoizing decorator around a measurer
///
/// Only successful measurements are cached; failures reach the caller every time.
pub struct CachingMeasurer<M> {
    inner: M,
    cache: Arc<RwLock<HashMap<MeasureKey, TextExtent>>>,
    hits: Arc<RwLock<usize>>,
    misses: Arc<RwLock<usize>>,
}

impl<M: TextMeasurer> CachingMeasurer<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Measurement cache cleared");
    }
}

impl<M: TextMeasurer> TextMeasurer for CachingMeasurer<M> {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError> {
        let key = MeasureKey::new(text, style);

        if let Some(extent) = self.cache.read().get(&key) {
            *self.hits.write() += 1;
            return Ok(*extent);
        }

        *self.misses.write() += 1;
        let extent = self.inner.measure(text, style)?;
        self.cache.write().insert(key, extent);
        Ok(extent)
    }
}

/// Heuristic measurer based on average glyph proportions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateMeasurer {
    /// Average glyph advance as a fraction of the font size
    pub advance_ratio: f64,
    /// Line height as a fraction of the font size
    pub line_height_ratio: f64,
}

impl Default for ApproximateMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_height_ratio: 1.2,
        }
    }
}

impl TextMeasurer for ApproximateMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError> {
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(MeasurementError::Failed {
                text: text.to_string(),
                reason: format!("unusable font size {}", style.font_size),
            });
        }

        let glyphs = text.chars().count() as f64;
        let stroke = 2.0 * style.stroke_width.max(0.0);
        let width = (glyphs * style.font_size * self.advance_ratio + stroke).round();
        let height = (style.font_size * self.line_height_ratio + stroke).round();

        checked_extent(text, TextExtent::new(width, height))
    }
}
