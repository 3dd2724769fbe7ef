use anyhow::{Context, Result, bail};
use clap::Parser;
use geo::Area;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use parkwatch::config::FileConfig;
use parkwatch::domain::ZoneMap;
use parkwatch::feed::{LabelVocabulary, read_detection_log};
use parkwatch::geometry::FrameScaler;
use parkwatch::occupancy::{DetectionFilter, FrameReport, OccupancyEngine, StatusLevel};
use parkwatch::output::{ConsoleSink, FrameRecord, JsonLinesSink, ReportSink};

/// Frames handed to the worker pool per progress update
const BATCH_FRAMES: usize = 256;

/// Replay recorded vehicle detections against a parking lot's zones and report
/// how many spaces are free in every frame
///
/// Examples:
///   # Use the built-in 12-space lot and print one line per frame
///   parkwatch --detections frames.jsonl
///
///   # Custom zones, detector ran at 1080p, write reports to a file
///   parkwatch --config lot.toml --detections frames.jsonl \
///     --source-width 1920 --source-height 1080 -o reports.jsonl --quiet
///
///   # Count trucks as well as cars and warn below 3 free spaces
///   parkwatch --detections frames.jsonl --label car --label truck --low-threshold 3
///
///   # Check a config file and show its zones
///   parkwatch --config lot.toml --list-zones
#[derive(Parser, Debug)]
#[command(name = "parkwatch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches parkwatch.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-lines detection log, one frame per line
    #[arg(short = 'd', long, required_unless_present = "list_zones")]
    detections: Option<PathBuf>,

    /// Write per-frame reports as JSON lines to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Detection label that can occupy a zone (repeatable, defaults to "car")
    #[arg(short = 'l', long = "label")]
    labels: Vec<String>,

    /// Availability at or below this count is reported as low
    #[arg(long)]
    low_threshold: Option<usize>,

    /// Width of the frames the detector ran on
    #[arg(long, requires = "source_height")]
    source_width: Option<u32>,

    /// Height of the frames the detector ran on
    #[arg(long, requires = "source_width")]
    source_height: Option<u32>,

    /// Class names file used to resolve numeric class ids (defaults to COCO)
    #[arg(long)]
    class_file: Option<PathBuf>,

    /// Worker threads used to classify frames
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Do not print a line per frame
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Print the configured zones and exit
    #[arg(long)]
    list_zones: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    // Logging is not set up yet, so config errors must propagate
    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            Some(FileConfig::from_file(config_path)?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load().context("Failed to load config file")?
    };
    let from_file = file_config.is_some();
    let mut config: FileConfig = file_config.unwrap_or_default();

    if !args.labels.is_empty() {
        config.allowed_labels = args.labels.clone();
    }
    if let Some(threshold) = args.low_threshold {
        config.low_threshold = threshold;
    }
    if let (Some(w), Some(h)) = (args.source_width, args.source_height) {
        config.source_width = Some(w);
        config.source_height = Some(h);
    }
    if args.class_file.is_some() {
        config.class_file = args.class_file.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    let verbose = args.verbose || config.verbose;

    init_logging(verbose);

    let zones = config.zone_map().context("Invalid zone configuration")?;

    if args.list_zones {
        print_zones(&zones, &config, from_file);
        return Ok(());
    }

    let detections_path = args
        .detections
        .clone()
        .context("--detections is required unless --list-zones is given")?;

    let vocab = match config.class_file {
        Some(ref path) => LabelVocabulary::from_file(path).context("Failed to load class file")?,
        None => LabelVocabulary::coco(),
    };

    let scaler = match config.source_size() {
        Some(source) => FrameScaler::new(source, config.frame_size())
            .context("Source and zone frame sizes must be non-zero")?,
        None => FrameScaler::identity(),
    };

    let engine = OccupancyEngine::new(zones)
        .with_filter(DetectionFilter::new(&config.allowed_labels))
        .with_scaler(scaler)
        .with_low_threshold(config.low_threshold);

    if verbose {
        println!("Configuration:");
        println!(
            "  Zones: {} ({})",
            engine.zones().len(),
            if from_file { "config file" } else { "built-in lot" }
        );
        println!(
            "  Labels: {}",
            engine.filter().labels().collect::<Vec<_>>().join(", ")
        );
        println!("  Low threshold: {}", engine.low_threshold());
        println!(
            "  Frame size: {}x{}",
            config.frame_width, config.frame_height
        );
        if let Some((w, h)) = config.source_size() {
            println!("  Source size: {}x{}", w, h);
        }
        println!("  Workers: {}", config.workers.max(1));
        println!();
    }

    let spinner = create_spinner("Reading detection log...");
    let start = Instant::now();
    let frames = read_detection_log(&detections_path, &vocab)
        .with_context(|| format!("Failed to read detections: {}", detections_path.display()))?;
    spinner.finish_with_message(format!(
        "Read {} frames [{:.1}s]",
        frames.len(),
        start.elapsed().as_secs_f32()
    ));

    if frames.is_empty() {
        bail!("No frames found in {}", detections_path.display());
    }

    let mut sinks: Vec<Box<dyn ReportSink + '_>> = Vec::new();
    if let Some(ref path) = args.output {
        sinks.push(Box::new(JsonLinesSink::create(path)?));
    }
    if !args.quiet {
        let stdout = std::io::stdout();
        let color = stdout.is_terminal();
        sinks.push(Box::new(
            ConsoleSink::new(stdout.lock(), engine.zones())
                .with_color(color)
                .with_zone_names(verbose),
        ));
    }

    let progress = if args.quiet {
        create_progress_bar(frames.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let start = Instant::now();
    let mut summary = Summary::default();

    for batch in frames.chunks(BATCH_FRAMES) {
        let outcomes = engine.process_batch(batch, config.workers);

        for (frame, outcome) in batch.iter().zip(&outcomes) {
            let record = FrameRecord::new(frame.index, outcome);
            for sink in sinks.iter_mut() {
                sink.write_frame(&record)?;
            }
            summary.add(&outcome.report, outcome.skipped);
        }
        progress.inc(batch.len() as u64);
    }

    for sink in sinks.iter_mut() {
        sink.finish()?;
    }
    drop(sinks);
    progress.finish_with_message(format!(
        "Classified {} frames [{:.1}s]",
        frames.len(),
        start.elapsed().as_secs_f32()
    ));

    println!();
    summary.print();
    if let Some(ref path) = args.output {
        println!("Reports: {}", path.display());
    }
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_zones(zones: &ZoneMap, config: &FileConfig, from_file: bool) {
    println!(
        "{} zones in a {}x{} frame ({})",
        zones.len(),
        config.frame_width,
        config.frame_height,
        if from_file { "config file" } else { "built-in lot" }
    );
    println!();
    for zone in zones {
        let bounds = zone.polygon.bounds();
        println!(
            "  [{:>2}] {:<12} {} vertices, {:.0} px², bounds ({:.0}, {:.0})-({:.0}, {:.0})",
            zone.id,
            zone.name,
            zone.polygon.vertices().len(),
            zone.polygon.to_geo().unsigned_area(),
            bounds.min_x,
            bounds.min_y,
            bounds.max_x,
            bounds.max_y
        );
    }
}

/// Totals across the whole replay
#[derive(Debug, Default)]
struct Summary {
    frames: usize,
    skipped: usize,
    low_frames: usize,
    min_available: Option<usize>,
    max_available: Option<usize>,
    last: Option<FrameReport>,
}

impl Summary {
    fn add(&mut self, report: &FrameReport, skipped: usize) {
        self.frames += 1;
        self.skipped += skipped;
        if report.status_level == StatusLevel::Low {
            self.low_frames += 1;
        }
        let available = report.available_count;
        self.min_available = Some(self.min_available.map_or(available, |m| m.min(available)));
        self.max_available = Some(self.max_available.map_or(available, |m| m.max(available)));
        self.last = Some(*report);
    }

    fn print(&self) {
        println!("Frames: {}", self.frames);
        println!("Skipped detections: {}", self.skipped);
        println!("Low availability frames: {}", self.low_frames);
        if let (Some(min), Some(max)) = (self.min_available, self.max_available) {
            println!("Available range: {} - {}", min, max);
        }
        if let Some(last) = self.last {
            println!(
                "Last frame: {} ({} of {} occupied)",
                last, last.occupied_count, last.total_zones
            );
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}
