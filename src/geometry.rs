/*!
 * Target frame geometry.
 *
 * Clips are scaled to the configured output height and center-cropped to the
 * configured aspect ratio before captions are burned in. Layout runs against
 * the resulting frame size, so it is computed here rather than read back from
 * the video provider.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

// @const: Output resolution pattern such as "1080p"
static RESOLUTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*[pP]\s*$").expect("valid resolution pattern")
});

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse "1920x1080"
    pub fn parse(value: &str) -> Result<Self, ConfigurationError> {
        let (w, h) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| ConfigurationError::invalid("frame_size", format!("expected WIDTHxHEIGHT, got '{}'", value)))?;

        let width: u32 = w.trim().parse().map_err(|_| {
            ConfigurationError::invalid("frame_size", format!("invalid width '{}'", w))
        })?;
        let height: u32 = h.trim().parse().map_err(|_| {
            ConfigurationError::invalid("frame_size", format!("invalid height '{}'", h))
        })?;

        if width == 0 || height == 0 {
            return Err(ConfigurationError::invalid("frame_size", "dimensions must be non-zero"));
        }

        Ok(Self { width, height })
    }
}

/// Horizontal crop applied to the scaled source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Left edge of the crop in scaled pixels
    pub x_offset: u32,
    /// Frame captions are laid out against
    pub frame: FrameSize,
}

/// Output resolution and aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    /// Output height in pixels
    pub resolution: u32,
    /// Aspect ratio as (width, height)
    pub aspect: (u32, u32),
}

impl OutputFormat {
    pub fn parse(resolution: &str, aspect: [u32; 2]) -> Result<Self, ConfigurationError> {
        let captures = RESOLUTION_REGEX.captures(resolution).ok_or_else(|| {
            ConfigurationError::invalid(
                "output_resolution",
                format!("expected a value like '1080p', got '{}'", resolution),
            )
        })?;

        let height: u32 = captures[1].parse().map_err(|_| {
            ConfigurationError::invalid("output_resolution", format!("out of range: '{}'", resolution))
        })?;

        if height == 0 {
            return Err(ConfigurationError::invalid("output_resolution", "must be non-zero"));
        }
        if aspect[0] == 0 || aspect[1] == 0 {
            return Err(ConfigurationError::invalid(
                "video_aspect_ratio",
                format!("both terms must be non-zero, got {:?}", aspect),
            ));
        }

        Ok(Self {
            resolution: height,
            aspect: (aspect[0], aspect[1]),
        })
    }

    /// Scale the source to the output height, then center-crop to the aspect ratio
    ///
    /// Crop width and offset are rounded down to even values for the encoder.
    pub fn target_frame(&self, source: FrameSize) -> CropWindow {
        let height = self.resolution;
        let scaled_width =
            (u64::from(source.width) * u64::from(height) / u64::from(source.height.max(1))) as u32;

        let mut crop_width = (u64::from(height) * u64::from(self.aspect.0) / u64::from(self.aspect.1)) as u32;
        if crop_width % 2 != 0 {
            crop_width -= 1;
        }
        crop_width = crop_width.min(scaled_width);

        let mut x_offset = (scaled_width - crop_width) / 2;
        if x_offset % 2 != 0 {
            x_offset -= 1;
        }

        CropWindow {
            x_offset,
            frame: FrameSize::new(crop_width, height),
        }
    }
}
