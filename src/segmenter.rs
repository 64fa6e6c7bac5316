/*!
 * Subtitle line segmentation.
 *
 * Groups a word stream into time-boxed lines in a single greedy pass. A word
 * is appended to the current line before the thresholds are checked, so the
 * word that trips a threshold closes the line it belongs to. A line may
 * therefore end up slightly over `max_chars` or `max_duration`; a single word
 * is never split.
 *
 * The gap check compares a word with its predecessor in the stream, not with
 * the previous word of the current line. Right after a line is closed, the
 * next word is still compared with the last word of the closed line.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::SubtitleConfig;
use crate::errors::ValidationError;
use crate::transcript::{Word, WordStream};

/// A group of consecutive words shown together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Space-joined text of the words
    #[serde(rename = "word")]
    pub text: String,

    /// Start of the first word
    pub start: f64,

    /// End of the last word
    pub end: f64,

    #[serde(rename = "textcontents")]
    pub words: Vec<Word>,
}

impl Line {
    /// Build a line from a non-empty run of words
    pub fn from_words(words: Vec<Word>) -> Option<Self> {
        let start = words.first()?.start;
        let end = words.last()?.end;
        let text = join_words(&words);

        Some(Self {
            text,
            start,
            end,
            words,
        })
    }

    /// Time between the first word's start and the last word's end
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Sum of the spoken durations of the words
    pub fn spoken_duration(&self) -> f64 {
        self.words.iter().map(Word::duration).sum()
    }

    /// Length of the text in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Greedy line segmenter
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    config: SubtitleConfig,
}

impl Segmenter {
    pub fn new(config: SubtitleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SubtitleConfig {
        &self.config
    }

    /// Validate the words, then segment them
    pub fn segment_words(&self, words: &[Word]) -> Result<Vec<Line>, ValidationError> {
        crate::transcript::validate_words(words)?;
        Ok(self.split(words))
    }

    /// Segment an already validated stream
    pub fn segment(&self, stream: &WordStream) -> Vec<Line> {
        self.split(stream.words())
    }

    fn split(&self, words: &[Word]) -> Vec<Line> {
        let SubtitleConfig {
            max_chars,
            max_duration,
            max_gap,
        } = self.config;

        let mut lines = Vec::new();
        let mut buffer: Vec<Word> = Vec::new();
        let mut buffer_duration = 0.0;
        let mut buffer_chars = 0usize;

        for (idx, word) in words.iter().enumerate() {
            if !buffer.is_empty() {
                buffer_chars += 1;
            }
            buffer_chars += word.text.chars().count();
            buffer_duration += word.duration();
            buffer.push(word.clone());

            let duration_exceeded = buffer_duration > max_duration;
            let chars_exceeded = buffer_chars > max_chars;
            let gap_exceeded = idx > 0 && word.start - words[idx - 1].end > max_gap;

            if duration_exceeded || chars_exceeded || gap_exceeded {
                debug!(
                    "Closing line at word {} (duration: {}, chars: {}, gap: {})",
                    idx, duration_exceeded, chars_exceeded, gap_exceeded
                );

                if buffer.len() == 1 && (duration_exceeded || chars_exceeded) {
                    warn!(
                        "Word {} ('{}') exceeds the line limits on its own and forms a single-word line",
                        idx,
                        word.text.trim()
                    );
                }

                lines.extend(Line::from_words(std::mem::take(&mut buffer)));
                buffer_duration = 0.0;
                buffer_chars = 0;
            }
        }

        lines.extend(Line::from_words(buffer));

        debug!("Segmented {} words into {} lines", words.len(), lines.len());
        lines
    }
}
