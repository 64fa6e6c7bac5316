// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clipcaps::app_config::{Config, LogLevel};
use clipcaps::app_controller::Controller;
use clipcaps::errors::AppError;
use clipcaps::file_utils::FileManager;
use clipcaps::font_config::FontConfigTable;
use clipcaps::geometry::FrameSize;
use clipcaps::line_store;
use clipcaps::measure::{ApproximateMeasurer, CachingMeasurer};
use clipcaps::render;
use clipcaps::segmenter::{Line, Segmenter};
use clipcaps::transcript::WordStream;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a word stream into subtitle lines
    Segment(SegmentArgs),

    /// Compute render descriptors for subtitle lines
    Layout(LayoutArgs),

    /// Lay out every pending clip of the configured workspace
    Run(RunArgs),

    /// Generate shell completions for clipcaps
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SegmentArgs {
    /// Word stream JSON produced by the transcriber
    #[arg(value_name = "WORDS")]
    words: PathBuf,

    /// Write the line artifact here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Override the maximum characters per line
    #[arg(long)]
    max_chars: Option<usize>,

    /// Override the maximum line duration in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// Override the maximum gap between words in seconds
    #[arg(long)]
    max_gap: Option<f64>,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Line artifact JSON (or a word stream with --words)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Treat INPUT as a word stream and segment it first
    #[arg(long)]
    words: bool,

    /// Frame width in pixels
    #[arg(long)]
    width: u32,

    /// Frame height in pixels
    #[arg(long)]
    height: u32,

    /// Font config table; defaults to the configured path
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Font config id; defaults to the configured id
    #[arg(long)]
    font_id: Option<String>,

    /// Seed for the highlight rotation jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Write descriptors here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Size of the source clips before scaling and cropping
    #[arg(long, default_value = "1920x1080")]
    source_size: String,

    /// Directory holding the `output/` tree
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

/// clipcaps - word-level caption segmentation and layout
#[derive(Parser, Debug)]
#[command(name = "clipcaps")]
#[command(version)]
#[command(about = "Segment word-level transcripts into captions and lay them out for rendering")]
#[command(long_about = "clipcaps turns word-level timestamps into subtitle lines and computes
per-word positions, highlight boxes and timings for a compositor.

EXAMPLES:
    clipcaps segment words.json -o lines.json
    clipcaps layout lines.json --width 606 --height 1080 --seed 7
    clipcaps layout words.json --words --width 1080 --height 1920
    clipcaps run --source-size 1920x1080
    clipcaps completions bash > clipcaps.bash

CONFIGURATION:
    Configuration is stored in config.json by default. If the file doesn't
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "config.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "clipcaps", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Segment(args) => run_segment(config, args),
        Commands::Layout(args) => Ok(run_layout(config, args)?),
        Commands::Run(args) => run_workspace(config, args).await,
        Commands::Completions { .. } => Ok(()),
    }
}

fn run_segment(mut config: Config, args: SegmentArgs) -> Result<()> {
    if let Some(max_chars) = args.max_chars {
        config.subtitle_config.max_chars = max_chars;
    }
    if let Some(max_duration) = args.max_duration {
        config.subtitle_config.max_duration = max_duration;
    }
    if let Some(max_gap) = args.max_gap {
        config.subtitle_config.max_gap = max_gap;
    }
    config.subtitle_config.validate().context("Invalid subtitle thresholds")?;

    let words = WordStream::load(&args.words)?;
    let lines = Segmenter::new(config.subtitle_config).segment(&words);
    info!("Split {} words into {} lines", words.len(), lines.len());

    match args.out {
        Some(path) => line_store::save_lines(&path, &lines)?,
        None => println!("{}", serde_json::to_string_pretty(&lines)?),
    }

    Ok(())
}

fn run_layout(config: Config, args: LayoutArgs) -> Result<(), AppError> {
    let fonts_path = args
        .fonts
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.font_config_path));
    let fonts = FontConfigTable::load(&fonts_path)?;
    let font_id = args.font_id.as_deref().unwrap_or(&config.font_config_id);
    let font = fonts.get(font_id)?;

    let lines: Vec<Line> = if args.words {
        config.subtitle_config.validate()?;
        let words = WordStream::load(&args.input)?;
        Segmenter::new(config.subtitle_config).segment(&words)
    } else {
        line_store::load_lines(&args.input)?
    };

    let mut rng = match args.seed.or(config.layout_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            warn!("No layout seed given, rotation jitter will differ between runs");
            StdRng::from_os_rng()
        }
    };

    let measurer = CachingMeasurer::new(ApproximateMeasurer::default());
    let frame = FrameSize::new(args.width, args.height);
    let json = render::render_lines_json(&lines, frame, font, &measurer, &mut rng)?;

    let (hits, misses, hit_rate) = measurer.stats();
    info!(
        "Laid out {} lines ({} measurements cached, {} measured, {:.0}% hit rate)",
        lines.len(),
        hits,
        misses,
        hit_rate * 100.0
    );

    match args.out {
        Some(path) => FileManager::write_to_file(&path, &json)?,
        None => println!("{}", json),
    }

    Ok(())
}

async fn run_workspace(config: Config, args: RunArgs) -> Result<()> {
    let source_frame = FrameSize::parse(&args.source_size)?;
    let controller = Arc::new(Controller::from_config_files(config, Path::new(&args.base_dir))?);
    info!("Workspace: {}", controller.workspace().root().display());

    let measurer = Arc::new(CachingMeasurer::new(ApproximateMeasurer::default()));
    let summary = controller.run_workspace(source_frame, measurer).await?;

    if !summary.failed.is_empty() {
        return Err(anyhow!("{} clip(s) failed", summary.failed.len()));
    }

    Ok(())
}
