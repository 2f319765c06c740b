use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use glint_vision::{detect_glasses, DetectOptions, LandmarkSet, Verdict};

use crate::report::Row;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Load a landmark sidecar file (the image path with a `.json` extension).
pub fn load_landmarks(path: &Path) -> Result<LandmarkSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading landmarks {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing landmarks {}", path.display()))
}

pub fn sidecar_path(image: &Path) -> PathBuf {
    image.with_extension("json")
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Evaluate every image in `dir`, one row per item.
///
/// Items are processed to completion one at a time; `cancel` is honored
/// between items, never mid-computation. An item without a usable image
/// or landmark sidecar produces a NaN sentinel row so a later
/// reclassification still accounts for it.
pub fn run(dir: &Path, opts: &DetectOptions, cancel: &AtomicBool) -> Result<Vec<Row>> {
    let files = image_files(dir)?;
    let total = files.len();
    info!("processing {} images in {}", total, dir.display());

    let mut rows = Vec::with_capacity(total);
    for file in files {
        if cancel.load(Ordering::Relaxed) {
            info!("batch cancelled after {} of {} items", rows.len(), total);
            break;
        }
        rows.push(process_item(&file, opts));
    }
    Ok(rows)
}

/// One item, one scope: the decoded image and every intermediate buffer
/// are dropped before the next item starts.
fn process_item(file: &Path, opts: &DetectOptions) -> Row {
    let path = file.display().to_string();
    match try_item(file, opts) {
        Ok(verdict) if verdict.is_valid() => {
            debug!(
                "{}: measure {:.4} -> {}",
                path, verdict.measure, verdict.with_glasses
            );
            Row::new(path, verdict.measure, verdict.with_glasses)
        }
        Ok(_) => {
            debug!("{}: no valid measurement", path);
            Row::invalid(path)
        }
        Err(e) => {
            warn!("{}: {:#}", path, e);
            Row::invalid(path)
        }
    }
}

fn try_item(file: &Path, opts: &DetectOptions) -> Result<Verdict> {
    let img = image::open(file).with_context(|| format!("opening {}", file.display()))?;
    let landmarks = load_landmarks(&sidecar_path(file))?;
    Ok(detect_glasses(&landmarks, &img, opts)?)
}
