/*!
 * Persisted line-level subtitles.
 *
 * Each clip gets one JSON artifact holding its segmented lines, in the shape
 * `[{word, start, end, textcontents: [{word, start, end}, ...]}, ...]`.
 * The artifact doubles as a cache: when it exists, segmentation (and the
 * transcription feeding it) is skipped. Layout is never cached because it
 * depends on the frame geometry of the current run.
 */

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::errors::ValidationError;
use crate::file_utils::FileManager;
use crate::segmenter::{Line, Segmenter};
use crate::transcript::{validate_words, Word, WordStream};

/// Where the lines returned by `load_or_segment` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    /// Loaded from an existing artifact
    Cached,
    /// Segmented in this run and written to the artifact
    Segmented,
}

/// Write lines to a JSON artifact
pub fn save_lines<P: AsRef<Path>>(path: P, lines: &[Line]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string(lines).context("Failed to serialize subtitle lines")?;
    FileManager::write_to_file(path, &json)?;
    debug!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}

/// Read lines back from a JSON artifact
///
/// The words of all lines, concatenated, must still form a valid stream.
pub fn load_lines<P: AsRef<Path>>(path: P) -> Result<Vec<Line>> {
    let path = path.as_ref();
    let content = FileManager::read_to_string(path)?;
    let lines: Vec<Line> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse subtitle artifact: {}", path.display()))?;

    validate_lines(&lines).with_context(|| format!("Invalid subtitle artifact: {}", path.display()))?;
    Ok(lines)
}

fn validate_lines(lines: &[Line]) -> Result<(), ValidationError> {
    if let Some(index) = lines.iter().position(|line| line.words.is_empty()) {
        return Err(ValidationError::EmptyLine { index });
    }

    let words: Vec<Word> = lines.iter().flat_map(|line| line.words.iter().cloned()).collect();
    validate_words(&words)
}

/// Return the cached lines for a clip, or segment and persist them
///
/// `produce_words` is only called when no artifact exists.
pub fn load_or_segment<P, F>(path: P, segmenter: &Segmenter, produce_words: F) -> Result<(Vec<Line>, LineSource)>
where
    P: AsRef<Path>,
    F: FnOnce() -> Result<WordStream>,
{
    let path = path.as_ref();

    if FileManager::file_exists(path) {
        info!("Subtitles already exist at {}", path.display());
        let lines = load_lines(path)?;
        return Ok((lines, LineSource::Cached));
    }

    let words = produce_words()?;
    let lines = segmenter.segment(&words);
    save_lines(path, &lines)?;
    info!("Split {} words into {} lines", words.len(), lines.len());

    Ok((lines, LineSource::Segmented))
}
