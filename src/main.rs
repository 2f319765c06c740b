use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glint::{batch, config, report};
use glint_vision::{detect_glasses, Strategy};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "glint")]
#[command(
    version,
    about = "Geometric eyeglasses detection from facial landmarks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect glasses on a single image with a landmark sidecar
    Detect {
        /// Image file
        image: PathBuf,
        /// Landmark JSON (defaults to the image path with a .json extension)
        #[arg(short, long)]
        landmarks: Option<PathBuf>,
        /// Measurement strategy: sobel-otsu, bridge or bridge-canny
        #[arg(short, long)]
        strategy: Option<Strategy>,
        /// Decision threshold override
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Evaluate a folder of images and write a CSV report
    Batch {
        /// Folder of images with landmark sidecars
        dir: PathBuf,
        /// Output CSV path
        #[arg(short, long, default_value = "glint.csv")]
        output: PathBuf,
        #[arg(short, long)]
        strategy: Option<Strategy>,
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Re-derive decisions in a stored CSV at a new threshold
    Reclassify {
        /// CSV produced by a previous batch run
        csv: PathBuf,
        #[arg(short, long)]
        threshold: f32,
        /// Output path (defaults to rewriting the input in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    match cli.command {
        Commands::Detect {
            image,
            landmarks,
            strategy,
            threshold,
        } => detect(&cfg, &image, landmarks.as_deref(), strategy, threshold),
        Commands::Batch {
            dir,
            output,
            strategy,
            threshold,
        } => run_batch(&cfg, &dir, &output, strategy, threshold),
        Commands::Reclassify {
            csv,
            threshold,
            output,
        } => reclassify(&csv, threshold, output.as_deref()),
        Commands::Config => open_config(),
    }
}

fn options_with_overrides(
    cfg: &config::Config,
    strategy: Option<Strategy>,
    threshold: Option<f32>,
) -> glint_vision::DetectOptions {
    let mut opts = cfg.detect_options();
    if let Some(s) = strategy {
        opts.strategy = s;
    }
    if let Some(t) = threshold {
        opts.threshold = Some(t);
    }
    opts
}

fn detect(
    cfg: &config::Config,
    image_path: &Path,
    landmarks: Option<&Path>,
    strategy: Option<Strategy>,
    threshold: Option<f32>,
) -> Result<()> {
    let opts = options_with_overrides(cfg, strategy, threshold);

    let img = image::open(image_path)
        .with_context(|| format!("opening {}", image_path.display()))?;
    let sidecar = landmarks
        .map(Path::to_path_buf)
        .unwrap_or_else(|| batch::sidecar_path(image_path));
    let set = batch::load_landmarks(&sidecar)?;

    let verdict = detect_glasses(&set, &img, &opts).context("detecting glasses")?;
    if verdict.is_valid() {
        info!(
            "{}: measure {:.4} ({}) -> {}",
            image_path.display(),
            verdict.measure,
            opts.strategy,
            if verdict.with_glasses {
                "glasses"
            } else {
                "no glasses"
            }
        );
    } else {
        warn!(
            "{}: no valid measurement (face too small or unreliable)",
            image_path.display()
        );
    }
    Ok(())
}

fn run_batch(
    cfg: &config::Config,
    dir: &Path,
    output: &Path,
    strategy: Option<Strategy>,
    threshold: Option<f32>,
) -> Result<()> {
    let opts = options_with_overrides(cfg, strategy, threshold);

    let cancel = AtomicBool::new(false);
    let rows = batch::run(dir, &opts, &cancel).context("running batch")?;

    let positives = rows.iter().filter(|r| r.with_glasses == 1).count();
    let invalid = rows.iter().filter(|r| r.measure.is_nan()).count();
    report::write_rows(output, &rows).context("writing report")?;

    info!(
        "wrote {} rows to {} ({} with glasses, {} without measurement)",
        rows.len(),
        output.display(),
        positives,
        invalid
    );
    Ok(())
}

fn reclassify(csv: &Path, threshold: f32, output: Option<&Path>) -> Result<()> {
    let mut rows = report::read_rows(csv)?;
    report::reclassify(&mut rows, threshold);

    let out = output.unwrap_or(csv);
    report::write_rows(out, &rows).context("writing report")?;

    let positives = rows.iter().filter(|r| r.with_glasses == 1).count();
    info!(
        "reclassified {} rows at threshold {:.3}: {} with glasses -> {}",
        rows.len(),
        threshold,
        positives,
        out.display()
    );
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
