use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use glint_vision::{align, pipeline, smoothing, DetectOptions, Strategy};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("GLINT_CONFIG_PATH").unwrap_or("/usr/local/etc/glint/config.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: Strategy,
    /// Decision threshold; omitted means the strategy default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    pub align_size: u32,
    pub min_eye_distance: f32,
    pub min_eye_ratio: f32,
    pub smoothing: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::SobelOtsu,
            threshold: None,
            align_size: align::DEFAULT_ALIGN_SIZE,
            min_eye_distance: pipeline::MIN_EYE_DISTANCE,
            min_eye_ratio: pipeline::MIN_EYE_RATIO,
            smoothing: smoothing::DEFAULT_WINDOW,
        }
    }
}

impl Config {
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            strategy: self.strategy,
            align_size: self.align_size,
            threshold: self.threshold,
            min_eye_distance: self.min_eye_distance,
            min_eye_ratio: self.min_eye_ratio,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
