use anyhow::{Result, Context};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// File names directly inside a directory
    pub fn list_file_names<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.context("Failed to read directory entry")?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}

/// Directory layout of one run: `<base>/output/<name>/...`
#[derive(Debug, Clone)]
pub struct ClipWorkspace {
    root: PathBuf,
}

impl ClipWorkspace {
    /// Workspace for a run name under a base directory
    pub fn new<P: AsRef<Path>>(base_dir: P, name: &str) -> Self {
        Self {
            root: base_dir.as_ref().join("output").join(name),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Trimmed source clips
    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    /// Captioned clips written by the renderer
    pub fn final_dir(&self) -> PathBuf {
        self.root.join("final")
    }

    /// Audio extracted for transcription
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// Line artifacts
    pub fn subtitles_dir(&self) -> PathBuf {
        self.root.join("subtitles")
    }

    /// Word streams written by the speech-to-text collaborator
    pub fn transcripts_dir(&self) -> PathBuf {
        self.root.join("transcripts")
    }

    /// Render descriptors
    pub fn layouts_dir(&self) -> PathBuf {
        self.root.join("layouts")
    }

    /// Create every workspace directory
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.clips_dir(),
            self.final_dir(),
            self.audio_dir(),
            self.subtitles_dir(),
            self.transcripts_dir(),
            self.layouts_dir(),
        ] {
            FileManager::ensure_dir(dir)?;
        }
        Ok(())
    }

    /// Clips that have no captioned counterpart yet, sorted by name
    pub fn pending_clips(&self) -> Result<Vec<String>> {
        let finished: HashSet<String> = FileManager::list_file_names(self.final_dir())?
            .into_iter()
            .collect();

        Ok(FileManager::list_file_names(self.clips_dir())?
            .into_iter()
            .filter(|clip| !finished.contains(clip))
            .collect())
    }

    pub fn clip_path(&self, clip: &str) -> PathBuf {
        self.clips_dir().join(clip)
    }

    pub fn subtitles_path(&self, clip: &str) -> PathBuf {
        self.subtitles_dir().join(json_name(clip))
    }

    pub fn transcript_path(&self, clip: &str) -> PathBuf {
        self.transcripts_dir().join(json_name(clip))
    }

    pub fn layout_path(&self, clip: &str) -> PathBuf {
        self.layouts_dir().join(json_name(clip))
    }
}

// @generates: "<stem>.json" for a clip file name
fn json_name(clip: &str) -> String {
    let stem = Path::new(clip)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| clip.to_string());
    format!("{}.json", stem)
}
