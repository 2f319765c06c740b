//! Full detection pipeline: landmarks -> eye centers -> gate -> align ->
//! measure -> classify.

use image::{DynamicImage, GenericImageView};

use crate::align;
use crate::error::{Error, Result};
use crate::geometry::{self, EyeCenters};
use crate::landmarks::{self, LandmarkSet};
use crate::measure::Strategy;

/// Hard floor on the inter-eye distance, in pixels.
pub const MIN_EYE_DISTANCE: f32 = 40.0;

/// Relative floor as a fraction of the shorter image side.
pub const MIN_EYE_RATIO: f32 = 0.055;

/// Tuning knobs for one detection call.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub strategy: Strategy,
    pub align_size: u32,
    /// Decision threshold; `None` uses the strategy default.
    pub threshold: Option<f32>,
    pub min_eye_distance: f32,
    pub min_eye_ratio: f32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::SobelOtsu,
            align_size: align::DEFAULT_ALIGN_SIZE,
            threshold: None,
            min_eye_distance: MIN_EYE_DISTANCE,
            min_eye_ratio: MIN_EYE_RATIO,
        }
    }
}

impl DetectOptions {
    pub fn resolved_threshold(&self) -> f32 {
        self.threshold
            .unwrap_or_else(|| self.strategy.default_threshold())
    }
}

/// Outcome of one detection: the raw measure and the thresholded decision.
///
/// A frame with no usable geometry carries a NaN measure, which keeps
/// "no measurement" distinguishable from a valid-but-low one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub measure: f32,
    pub with_glasses: bool,
}

impl Verdict {
    /// The sentinel verdict for frames without a valid measurement.
    pub fn none() -> Self {
        Self {
            measure: f32::NAN,
            with_glasses: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.measure.is_finite()
    }
}

/// `measure > threshold`; NaN never classifies as glasses.
pub fn classify(measure: f32, threshold: f32) -> bool {
    measure > threshold
}

/// Minimum-interocular-distance gate. The floor is the larger of the
/// fixed pixel floor and the relative floor, and sitting exactly on it is
/// accepted.
pub fn gate_accepts(eyes: &EyeCenters, width: u32, height: u32, opts: &DetectOptions) -> bool {
    let dist = eyes.distance();
    if !dist.is_finite() {
        return false;
    }
    let floor = opts
        .min_eye_distance
        .max(opts.min_eye_ratio * width.min(height) as f32);
    dist >= floor
}

/// Run the whole pipeline on one face image.
///
/// Degenerate geometry (face too small or too obliquely detected) yields
/// the NaN sentinel rather than an error so frame and batch loops can
/// keep going; the fatal error kinds are reserved for inputs the caller
/// must not retry. The core never retries internally.
pub fn detect_glasses(
    set: &LandmarkSet,
    img: &DynamicImage,
    opts: &DetectOptions,
) -> Result<Verdict> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidSource(format!(
            "no readable dimensions ({width}x{height})"
        )));
    }

    let corners = landmarks::eye_corners(set, width, height)?;
    let centers = geometry::eye_centers(&corners);
    if !gate_accepts(&centers, width, height, opts) {
        log::debug!(
            "gate rejected inter-eye distance {:.1}px on {}x{} image",
            centers.distance(),
            width,
            height
        );
        return Ok(Verdict::none());
    }

    let aligned = DynamicImage::ImageRgb8(align::align_face(img, &centers, opts.align_size));
    let measure = opts.strategy.measure(&aligned);
    Ok(Verdict {
        measure,
        with_glasses: classify(measure, opts.resolved_threshold()),
    })
}
