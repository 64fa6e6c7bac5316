/*!
 * Error types for the clipcaps library.
 *
 * This module contains custom error types for the different stages of the
 * caption engine, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised when a word stream or a cached line artifact is malformed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A word ends before it starts
    #[error("Word {index} has an invalid time range: end {end}s < start {start}s")]
    InvalidTimeRange {
        /// Position of the word in the stream
        index: usize,
        /// Start time in seconds
        start: f64,
        /// End time in seconds
        end: f64,
    },

    /// A word starts before its predecessor
    #[error("Word {index} starts at {start}s, before the previous word's start {previous_start}s")]
    NonMonotonicStart {
        /// Position of the word in the stream
        index: usize,
        /// Start of the preceding word
        previous_start: f64,
        /// Start of this word
        start: f64,
    },

    /// A timestamp is NaN or infinite
    #[error("Word {index} has a non-finite timestamp")]
    NonFiniteTimestamp {
        /// Position of the word in the stream
        index: usize,
    },

    /// A cached line holds no words
    #[error("Line {index} contains no words")]
    EmptyLine {
        /// Position of the line in the artifact
        index: usize,
    },
}

/// Errors raised while loading or resolving configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The requested font configuration id is not present in the table
    #[error("Unknown font config id: {0}")]
    UnknownFontConfig(String),

    /// The configuration document could not be parsed
    #[error("Malformed configuration: {0}")]
    Malformed(String),

    /// A key holds a value outside its accepted range
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the offending key
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(String),
}

impl ConfigurationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a text measurer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    /// The measuring collaborator could not size the text
    #[error("Failed to measure '{text}': {reason}")]
    Failed {
        /// Text that was being measured
        text: String,
        /// Reason reported by the measurer
        reason: String,
    },

    /// The measurer returned a negative or non-finite extent
    #[error("Invalid extent for '{text}': {width}x{height}")]
    InvalidExtent {
        /// Text that was being measured
        text: String,
        /// Reported width
        width: f64,
        /// Reported height
        height: f64,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Malformed word stream or line artifact
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Text measurement failure during layout
    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    /// Descriptors or artifacts could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
