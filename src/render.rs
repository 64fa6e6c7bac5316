/*!
 * Render descriptors handed to the compositor.
 *
 * A descriptor carries everything needed to draw one subtitle line: the
 * positioned words, their highlight decorations, the line background box and
 * the overlay origin on the frame. Descriptors are plain data; they are
 * serialized to JSON for out-of-process renderers.
 */

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::errors::{AppError, ConfigurationError, MeasurementError};
use crate::font_config::{FontConfig, Rgb};
use crate::geometry::FrameSize;
use crate::layout::LineLayoutEngine;
use crate::measure::{TextMeasurer, TextStyle};
use crate::segmenter::Line;

/// Padding factor applied to boxes drawn around text
pub const BOX_PADDING: f64 = 1.1;

/// Half-open visibility interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A word placed on the caption canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedWord {
    pub word: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Own start of the word
    pub start: f64,
    /// Own end of the word
    pub end: f64,
    pub duration: f64,
    /// Visual row within the line, from the top
    pub row: usize,
    /// When the regular text of the word is shown
    pub visible: TimeWindow,
}

/// Decorated, animated rendering of one word
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightWord {
    pub word: String,
    /// Top-left of the box on the caption canvas
    pub x: f64,
    pub y: f64,
    pub box_width: f64,
    pub box_height: f64,
    pub corner_radius: f64,
    pub fill: Rgb,
    pub opacity: f64,
    pub text_style: TextStyle,
    /// Offset of the highlighted text inside the box, centering it
    pub text_offset_x: f64,
    pub text_offset_y: f64,
    /// Rotation of the whole unit in degrees
    pub rotation_degrees: f64,
    /// When the decorated unit is shown
    pub window: TimeWindow,
    /// When the word is actually spoken
    pub spoken: TimeWindow,
}

/// Box drawn behind the whole line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBackground {
    pub width: f64,
    pub height: f64,
    pub color: Rgb,
    pub opacity: f64,
    pub window: TimeWindow,
}

/// Placement computed by the layout engine for one line
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlacement {
    pub words: Vec<PositionedWord>,
    pub highlights: Vec<HighlightWord>,
}

impl LinePlacement {
    /// Bounding box of all placed words as (max_width, max_height)
    pub fn bounds(&self) -> (f64, f64) {
        self.words.iter().fold((0.0_f64, 0.0_f64), |(w, h), word| {
            (w.max(word.x + word.width), h.max(word.y + word.height))
        })
    }
}

/// Everything the renderer needs to draw one line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDescriptor<'a> {
    pub line_index: usize,
    pub text: String,
    pub window: TimeWindow,
    pub words: Vec<PositionedWord>,
    pub highlights: Vec<HighlightWord>,
    pub max_width: f64,
    pub max_height: f64,
    pub background: LineBackground,
    /// Top-left of the caption canvas on the frame
    pub origin_x: f64,
    pub origin_y: f64,
    pub font: &'a FontConfig,
}

/// Wrap a placement with the line background and overlay origin
pub fn package<'a>(
    line_index: usize,
    line: &Line,
    placement: LinePlacement,
    frame: FrameSize,
    font: &'a FontConfig,
) -> RenderDescriptor<'a> {
    let (max_width, max_height) = placement.bounds();
    let window = TimeWindow::new(line.start, line.end);

    let scale = BOX_PADDING * font.background.size_factor;
    let background = LineBackground {
        width: (max_width * scale).floor(),
        height: (max_height * scale).floor(),
        color: font.background.color,
        opacity: font.background.opacity,
        window,
    };

    let frame_width = f64::from(frame.width);
    let frame_height = f64::from(frame.height);
    let origin_x = (frame_width - background.width) / 2.0;
    let origin_y = frame_height - max_height - font.bottom_offset_factor * frame_height;

    RenderDescriptor {
        line_index,
        text: line.text.clone(),
        window,
        words: placement.words,
        highlights: placement.highlights,
        max_width,
        max_height,
        background,
        origin_x,
        origin_y,
        font,
    }
}

/// Lay out every line of a clip, in order
///
/// Stops at the first measurement failure.
pub fn render_lines<'a, M, R>(
    lines: &[Line],
    frame: FrameSize,
    font: &'a FontConfig,
    measurer: &M,
    rng: &mut R,
) -> Result<Vec<RenderDescriptor<'a>>, MeasurementError>
where
    M: TextMeasurer + ?Sized,
    R: Rng + ?Sized,
{
    let engine = LineLayoutEngine::new(font, measurer);

    let descriptors = lines
        .iter()
        .enumerate()
        .map(|(index, line)| engine.layout_indexed(index, line, frame, font.words_on_the_go, rng))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Rendered {} line descriptors for a {}x{} frame", descriptors.len(), frame.width, frame.height);
    Ok(descriptors)
}

/// Lay out every line of a clip and serialize the descriptors for the renderer
///
/// The style record is validated here as it may have been built in code
/// rather than loaded from a table.
pub fn render_lines_json<M, R>(
    lines: &[Line],
    frame: FrameSize,
    font: &FontConfig,
    measurer: &M,
    rng: &mut R,
) -> Result<String, AppError>
where
    M: TextMeasurer + ?Sized,
    R: Rng + ?Sized,
{
    if frame.width == 0 || frame.height == 0 {
        return Err(ConfigurationError::invalid(
            "frame",
            format!("dimensions must be non-zero, got {}x{}", frame.width, frame.height),
        )
        .into());
    }
    font.validate()?;

    let descriptors = render_lines(lines, frame, font, measurer, rng)?;
    Ok(serde_json::to_string_pretty(&descriptors)?)
}
