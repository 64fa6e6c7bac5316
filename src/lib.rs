/*!
 * # clipcaps - word-level caption segmentation and layout
 *
 * A Rust library that turns word-level transcript timestamps into animated,
 * highlighted captions ready to be composited onto short video clips.
 *
 * ## Features
 *
 * - Greedy segmentation of a word stream into subtitle lines bounded by
 *   character count, duration and silence gaps
 * - Deterministic word-wrap layout of each line against the output frame
 * - Per-word highlight boxes with seeded rotation jitter
 * - Line background boxes and overlay placement for the compositor
 * - Line artifacts cached per clip so reruns skip segmentation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `transcript`: Word and validated word stream input
 * - `segmenter`: Line segmentation
 * - `layout`: Word-wrap and highlight decoration of one line
 * - `render`: Render descriptors handed to the compositor
 * - `measure`: Text measurement capability and its caching decorator
 * - `font_config`: Caption style records
 * - `geometry`: Output frame computation
 * - `line_store`: Persisted line artifacts
 * - `app_config`: Run configuration
 * - `file_utils`: Workspace directories and file helpers
 * - `app_controller`: Batch pass over the clips of a run
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod font_config;
pub mod geometry;
pub mod layout;
pub mod line_store;
pub mod measure;
pub mod render;
pub mod segmenter;
pub mod transcript;

// Re-export main types for easier usage
pub use app_config::{Config, SubtitleConfig};
pub use errors::{AppError, ConfigurationError, MeasurementError, ValidationError};
pub use font_config::{FontConfig, FontConfigTable};
pub use geometry::FrameSize;
pub use layout::LineLayoutEngine;
pub use measure::{TextExtent, TextMeasurer, TextStyle};
pub use render::{render_lines, PositionedWord, RenderDescriptor};
pub use segmenter::{Line, Segmenter};
pub use transcript::{Word, WordStream};
