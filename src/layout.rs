/*!
 * Line layout engine.
 *
 * Places the words of one subtitle line on a caption canvas with greedy
 * word-wrap, then decorates every word with its highlight box.
 *
 * Rules:
 * - a horizontal margin of a tenth of the frame width is kept on each side
 * - a word goes on the current row when the row width plus the word and one
 *   spacing glyph still fits, otherwise it opens a new row 10px below
 * - a word wider than the whole row is still placed, alone on its row; when it
 *   is the first word the first row stays empty
 * - the only non-deterministic input is the rotation jitter, drawn from the
 *   caller's random source
 */

use log::{debug, warn};
use rand::Rng;

use crate::errors::MeasurementError;
use crate::font_config::FontConfig;
use crate::geometry::FrameSize;
use crate::measure::{checked_extent, TextExtent, TextMeasurer, TextStyle};
use crate::render::{self, HighlightWord, LinePlacement, PositionedWord, RenderDescriptor, TimeWindow, BOX_PADDING};
use crate::segmenter::Line;

/// Vertical gap between visual rows in pixels
pub const ROW_GAP: f64 = 10.0;

/// Fraction of the frame width reserved as margin on each side
pub const MARGIN_FRACTION: f64 = 0.1;

/// Largest rotation jitter applied to a highlighted word
pub const MAX_ROTATION_DEGREE: f64 = 360.0;

/// Usable row width for a frame width
pub fn max_line_width(frame_width: u32) -> f64 {
    let frame_width = f64::from(frame_width);
    frame_width - 2.0 * (frame_width * MARGIN_FRACTION)
}

/// Upper bound of the rotation jitter in degrees
///
/// Non-finite or non-positive bounds disable the jitter. Bounds above a full
/// turn are clamped to it.
pub fn rotation_bound(max_degree: f64) -> f64 {
    if !max_degree.is_finite() || max_degree <= 0.0 {
        if max_degree != 0.0 {
            warn!("Ignoring rotation bound {}, words are not rotated", max_degree);
        }
        return 0.0;
    }
    max_degree.min(MAX_ROTATION_DEGREE)
}

/// Lays out lines against one style record and one measurer
pub struct LineLayoutEngine<'f, 'm, M: ?Sized> {
    font: &'f FontConfig,
    measurer: &'m M,
}

impl<'f, 'm, M: TextMeasurer + ?Sized> LineLayoutEngine<'f, 'm, M> {
    pub fn new(font: &'f FontConfig, measurer: &'m M) -> Self {
        Self { font, measurer }
    }

    /// Lay out a line using the timing mode of the style record
    pub fn layout<R: Rng + ?Sized>(
        &self,
        line: &Line,
        frame: FrameSize,
        rng: &mut R,
    ) -> Result<RenderDescriptor<'f>, MeasurementError> {
        self.layout_indexed(0, line, frame, self.font.words_on_the_go, rng)
    }

    /// Lay out a line with an explicit timing mode
    pub fn layout_with_mode<R: Rng + ?Sized>(
        &self,
        line: &Line,
        frame: FrameSize,
        words_on_the_go: bool,
        rng: &mut R,
    ) -> Result<RenderDescriptor<'f>, MeasurementError> {
        self.layout_indexed(0, line, frame, words_on_the_go, rng)
    }

    pub(crate) fn layout_indexed<R: Rng + ?Sized>(
        &self,
        line_index: usize,
        line: &Line,
        frame: FrameSize,
        words_on_the_go: bool,
        rng: &mut R,
    ) -> Result<RenderDescriptor<'f>, MeasurementError> {
        let base_font_size = self.font.base_font_size(frame.height);
        let words = self.place_words(line, frame, base_font_size, words_on_the_go)?;
        let highlights = self.decorate(&words, base_font_size, rng)?;

        Ok(render::package(
            line_index,
            line,
            LinePlacement { words, highlights },
            frame,
            self.font,
        ))
    }

    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextExtent, MeasurementError> {
        let extent = self.measurer.measure(text, style)?;
        checked_extent(text, extent)
    }

    /// Greedy word-wrap of the line into visual rows
    pub fn place_words(
        &self,
        line: &Line,
        frame: FrameSize,
        base_font_size: f64,
        words_on_the_go: bool,
    ) -> Result<Vec<PositionedWord>, MeasurementError> {
        let max_line_width = max_line_width(frame.width);
        let normal_style = self.font.normal_style(base_font_size);
        let spacing_style = self.font.spacing_style(base_font_size);

        let mut placed: Vec<PositionedWord> = Vec::with_capacity(line.words.len());
        let mut x = 0.0;
        let mut y = 0.0;
        let mut line_width = 0.0;
        let mut row = 0usize;
        let mut previous_height: Option<f64> = None;

        for word in &line.words {
            let word_extent = self.measure(&word.text, &normal_style)?;
            let space_extent = self.measure(&self.font.spacing.text, &spacing_style)?;
            let advance = word_extent.width + space_extent.width;

            let fits = line_width + advance <= max_line_width;
            if !fits {
                x = 0.0;
                y += previous_height.unwrap_or(word_extent.height) + ROW_GAP;
                line_width = 0.0;
                row += 1;
            }

            if advance > max_line_width {
                warn!(
                    "Word '{}' ({}px) is wider than the row ({}px) and is placed alone",
                    word.text.trim(),
                    word_extent.width,
                    max_line_width
                );
            }

            let visible = if words_on_the_go {
                TimeWindow::new(word.start, line.end)
            } else {
                TimeWindow::new(line.start, line.end)
            };

            placed.push(PositionedWord {
                word: word.text.clone(),
                x,
                y,
                width: word_extent.width,
                height: word_extent.height,
                start: word.start,
                end: word.end,
                duration: word.duration(),
                row,
                visible,
            });

            x += advance;
            line_width += advance;
            previous_height = Some(word_extent.height);
        }

        debug!("Placed {} words on {} row(s) for '{}'", placed.len(), row + 1, line.text.trim());
        Ok(placed)
    }

    /// Build the highlight unit of every placed word
    pub fn decorate<R: Rng + ?Sized>(
        &self,
        words: &[PositionedWord],
        base_font_size: f64,
        rng: &mut R,
    ) -> Result<Vec<HighlightWord>, MeasurementError> {
        let highlighted = &self.font.highlighted;
        let text_style = self.font.highlighted_style(base_font_size);
        let scale = BOX_PADDING * highlighted.font_size_factor;
        let max_degree = rotation_bound(highlighted.rotate_random_degree);

        words
            .iter()
            .map(|word| -> Result<HighlightWord, MeasurementError> {
                let box_width = (word.width * scale).floor();
                let box_height = (word.height * scale).floor();
                let text_extent = self.measure(&word.word, &text_style)?;

                let rotation_degrees = if max_degree > 0.0 {
                    rng.random_range(-max_degree..=max_degree)
                } else {
                    0.0
                };

                Ok(HighlightWord {
                    word: word.word.clone(),
                    x: word.x,
                    y: word.y,
                    box_width,
                    box_height,
                    corner_radius: highlighted.highlight_box.radius,
                    fill: highlighted.highlight_box.color,
                    opacity: highlighted.highlight_box.opacity,
                    text_style: text_style.clone(),
                    text_offset_x: (box_width - text_extent.width) / 2.0,
                    text_offset_y: (box_height - text_extent.height) / 2.0,
                    rotation_degrees,
                    window: word.visible,
                    spoken: TimeWindow::new(word.start, word.end),
                })
            })
            .collect()
    }
}
