/*!
 * Word-level transcript input.
 *
 * The speech-to-text collaborator hands over either a flat list of
 * `{word, start, end}` records or a list of segments that each carry their
 * own `words`. Both shapes are flattened into a validated `WordStream`.
 */

use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A transcribed word with its timing in the source audio, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text exactly as produced by the transcriber
    #[serde(rename = "word")]
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,
}

impl Word {
    /// Create a new word
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Spoken duration of the word
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One transcriber segment holding its words
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Words(Vec<Word>),
    Segments { segments: Vec<TranscriptSegment> },
}

/// Ordered, validated sequence of words
///
/// Starts are non-decreasing and every word satisfies `end >= start`.
/// A stream is never reordered or clamped: malformed input is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WordStream {
    words: Vec<Word>,
}

impl WordStream {
    /// Validate and wrap a list of words
    pub fn new(words: Vec<Word>) -> Result<Self, ValidationError> {
        validate_words(&words)?;
        Ok(Self { words })
    }

    /// Flatten transcriber segments into a single stream
    pub fn from_segments(segments: Vec<TranscriptSegment>) -> Result<Self, ValidationError> {
        let words: Vec<Word> = segments.into_iter().flat_map(|s| s.words).collect();
        Self::new(words)
    }

    /// Parse either transcript shape from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: TranscriptDocument =
            serde_json::from_str(json).context("Failed to parse word stream JSON")?;

        let stream = match document {
            TranscriptDocument::Words(words) => Self::new(words)?,
            TranscriptDocument::Segments { segments } => Self::from_segments(segments)?,
        };

        debug!("Loaded word stream with {} words", stream.len());
        Ok(stream)
    }

    /// Load a word stream from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word stream: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid word stream: {}", path.display()))
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }
}

/// Check the stream ordering rules without taking ownership
pub fn validate_words(words: &[Word]) -> Result<(), ValidationError> {
    let mut previous_start: Option<f64> = None;

    for (index, word) in words.iter().enumerate() {
        if !word.start.is_finite() || !word.end.is_finite() {
            return Err(ValidationError::NonFiniteTimestamp { index });
        }

        if word.end < word.start {
            return Err(ValidationError::InvalidTimeRange {
                index,
                start: word.start,
                end: word.end,
            });
        }

        if let Some(previous_start) = previous_start {
            if word.start < previous_start {
                return Err(ValidationError::NonMonotonicStart {
                    index,
                    previous_start,
                    start: word.start,
                });
            }
        }

        previous_start = Some(word.start);
    }

    Ok(())
}
