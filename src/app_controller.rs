use anyhow::{Context, Result, anyhow};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::file_utils::{ClipWorkspace, FileManager};
use crate::font_config::{FontConfig, FontConfigTable};
use crate::geometry::FrameSize;
use crate::line_store::{self, LineSource};
use crate::measure::TextMeasurer;
use crate::render;
use crate::segmenter::Segmenter;
use crate::transcript::WordStream;

// @module: Application controller for caption layout

/// Outcome of preparing one clip
#[derive(Debug, Clone)]
pub struct ClipReport {
    pub clip: String,
    pub line_count: usize,
    pub word_count: usize,
    pub line_source: LineSource,
    /// Frame the captions were laid out against
    pub frame: FrameSize,
    pub layout_path: PathBuf,
}

/// Outcome of a workspace pass
#[derive(Debug, Default)]
pub struct WorkspaceSummary {
    pub processed: Vec<ClipReport>,
    /// Clip name and error message for every failed clip
    pub failed: Vec<(String, String)>,
}

/// Main application controller for caption layout
pub struct Controller {
    // @field: Run configuration
    config: Config,
    // @field: Style table the configured font id resolves against
    fonts: FontConfigTable,
    // @field: Directories of this run
    workspace: ClipWorkspace,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config<P: AsRef<Path>>(config: Config, fonts: FontConfigTable, base_dir: P) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        fonts
            .get(&config.font_config_id)
            .context("Configured font config is not available")?;

        let workspace = ClipWorkspace::new(base_dir, &config.name);

        Ok(Self {
            config,
            fonts,
            workspace,
        })
    }

    /// Load the font table named in the configuration, then build the controller
    pub fn from_config_files<P: AsRef<Path>>(config: Config, base_dir: P) -> Result<Self> {
        let fonts = FontConfigTable::load(&config.font_config_path)
            .with_context(|| format!("Failed to load font config table: {}", config.font_config_path))?;
        Self::with_config(config, fonts, base_dir)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &ClipWorkspace {
        &self.workspace
    }

    /// Style record selected by the configuration
    pub fn font(&self) -> Result<&FontConfig> {
        Ok(self.fonts.get(&self.config.font_config_id)?)
    }

    pub fn segmenter(&self) -> Segmenter {
        Segmenter::new(self.config.subtitle_config)
    }

    /// Segment (or load cached lines for) one clip and write its render descriptors
    pub fn prepare_clip<M, R>(&self, clip: &str, source_frame: FrameSize, measurer: &M, rng: &mut R) -> Result<ClipReport>
    where
        M: TextMeasurer + ?Sized,
        R: Rng + ?Sized,
    {
        let font = self.font()?;
        let crop = self.config.output_format()?.target_frame(source_frame);
        debug!(
            "Clip {}: source {}x{} -> frame {}x{} (x offset {})",
            clip, source_frame.width, source_frame.height, crop.frame.width, crop.frame.height, crop.x_offset
        );

        if !FileManager::file_exists(self.workspace.clip_path(clip)) {
            warn!("Clip file {} is missing, continuing from its transcript", clip);
        }

        let transcript_path = self.workspace.transcript_path(clip);
        let (lines, line_source) = line_store::load_or_segment(
            self.workspace.subtitles_path(clip),
            &self.segmenter(),
            || WordStream::load(&transcript_path),
        )?;

        let json = render::render_lines_json(&lines, crop.frame, font, measurer, rng)
            .with_context(|| format!("Layout failed for clip {}", clip))?;

        let layout_path = self.workspace.layout_path(clip);
        FileManager::write_to_file(&layout_path, &json)?;

        Ok(ClipReport {
            clip: clip.to_string(),
            line_count: lines.len(),
            word_count: lines.iter().map(|l| l.words.len()).sum(),
            line_source,
            frame: crop.frame,
            layout_path,
        })
    }

    /// Prepare every pending clip of the workspace
    ///
    /// Clips are laid out on blocking workers. Each clip draws its rotations
    /// from its own generator, seeded from `layout_seed` plus the clip's index
    /// when a seed is configured.
    pub async fn run_workspace<M>(self: Arc<Self>, source_frame: FrameSize, measurer: Arc<M>) -> Result<WorkspaceSummary>
    where
        M: TextMeasurer + Send + Sync + 'static,
    {
        self.workspace.ensure_dirs()?;
        let clips = self.workspace.pending_clips()?;
        info!("Clips to process: {}", clips.len());

        if clips.is_empty() {
            return Ok(WorkspaceSummary::default());
        }

        let progress_bar = ProgressBar::new(clips.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("=>-"));
        progress_bar.set_message("Laying out captions");

        let seed = self.config.layout_seed;
        let tasks = clips.iter().enumerate().map(|(index, clip)| {
            let controller = Arc::clone(&self);
            let measurer = Arc::clone(&measurer);
            let progress_bar = progress_bar.clone();
            let clip = clip.clone();

            tokio::task::spawn_blocking(move || {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                    None => StdRng::from_os_rng(),
                };
                let result = controller.prepare_clip(&clip, source_frame, measurer.as_ref(), &mut rng);
                progress_bar.inc(1);
                (clip, result)
            })
        });

        let mut summary = WorkspaceSummary::default();
        for joined in join_all(tasks).await {
            let (clip, result) = joined.map_err(|e| anyhow!("Layout worker panicked: {}", e))?;
            match result {
                Ok(report) => {
                    debug!("Clip {}: {} lines ({:?})", report.clip, report.line_count, report.line_source);
                    summary.processed.push(report);
                }
                Err(e) => {
                    error!("Error processing clip {}: {:#}", clip, e);
                    summary.failed.push((clip, format!("{:#}", e)));
                }
            }
        }

        progress_bar.finish_with_message("Done");
        info!(
            "Finished: {} clip(s) laid out, {} failed",
            summary.processed.len(),
            summary.failed.len()
        );

        Ok(summary)
    }
}
