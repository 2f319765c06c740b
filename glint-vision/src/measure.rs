//! Edge-density measurement over the aligned face.
//!
//! Three strategies share the measure interface and are selected
//! explicitly, never inferred from the input. All of them read the
//! aligned face without mutating it and return a non-negative fraction.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use imageproc::gradients::vertical_sobel;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

/// Gaussian sigma for the Sobel+Otsu pre-blur (the sigma OpenCV derives
/// for an 11x11 kernel).
const SOBEL_BLUR_SIGMA: f32 = 2.0;

/// Weights of the bridge and temple ROI groups in the combined measure.
/// The temple group is the more discriminative of the two.
const BRIDGE_WEIGHT: f32 = 0.3;
const TEMPLE_WEIGHT: f32 = 0.7;

/// Nasal-bridge strip geometry, as fractions of the aligned size.
const STRIP_WIDTH_FRACTION: f32 = 0.08;
const STRIP_TOP_FRACTION: f32 = 0.30;
const STRIP_BOTTOM_FRACTION: f32 = 0.65;

/// Absolute vertical-gradient threshold on the 8-bit intensity scale.
const STRIP_GRADIENT_THRESHOLD: i16 = 12;

/// Canny hysteresis thresholds for the binary bridge variant.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 100.0;

/// Edge-measurement strategy over the aligned face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Dual-ROI vertical Sobel magnitude with Otsu binarization.
    SobelOtsu,
    /// Center-column gradient count over a nasal-bridge strip.
    Bridge,
    /// Canny edges over the same strip; any edge pixel counts.
    BridgeCanny,
}

impl Strategy {
    /// Decision threshold used when the caller does not override it.
    pub fn default_threshold(&self) -> f32 {
        match self {
            Strategy::SobelOtsu => 0.13,
            Strategy::Bridge => 0.07,
            Strategy::BridgeCanny => 0.0,
        }
    }

    /// Compute the edge measure of an aligned face.
    pub fn measure(&self, face: &DynamicImage) -> f32 {
        match self {
            Strategy::SobelOtsu => {
                let (bridge, temples) = sobel_otsu_fractions(face);
                BRIDGE_WEIGHT * bridge + TEMPLE_WEIGHT * temples
            }
            Strategy::Bridge => bridge_gradient_measure(face),
            Strategy::BridgeCanny => bridge_canny_measure(face),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sobel-otsu" => Ok(Strategy::SobelOtsu),
            "bridge" => Ok(Strategy::Bridge),
            "bridge-canny" => Ok(Strategy::BridgeCanny),
            other => Err(format!(
                "unknown strategy '{other}' (expected sobel-otsu, bridge or bridge-canny)"
            )),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::SobelOtsu => "sobel-otsu",
            Strategy::Bridge => "bridge",
            Strategy::BridgeCanny => "bridge-canny",
        })
    }
}

/// Edge fractions of the two Sobel+Otsu ROI groups: (bridge, temples).
///
/// Grayscale, Gaussian blur, vertical Sobel magnitude saturated onto the
/// 8-bit scale, Otsu level over the full magnitude image, then the
/// fraction of above-level pixels inside each ROI group. ROI geometry is
/// derived from d = floor(height / 2) in top-left-origin coordinates.
pub fn sobel_otsu_fractions(face: &DynamicImage) -> (f32, f32) {
    let gray = face.to_luma8();
    let blurred = gaussian_blur_f32(&gray, SOBEL_BLUR_SIGMA);
    let sobel = vertical_sobel(&blurred);
    let mag = GrayImage::from_fn(blurred.width(), blurred.height(), |x, y| {
        Luma([sobel.get_pixel(x, y)[0].unsigned_abs().min(255) as u8])
    });
    let level = otsu_level(&mag);

    let d = (mag.height() / 2) as i32;
    // Nasal-bridge rectangle
    let bridge = [Rect::at(d * 6 / 7, d * 3 / 4).of_size(
        (d * 2 / 7).max(1) as u32,
        (d / 2).max(1) as u32,
    )];
    // Two symmetric temple/lens rectangles, combined into one group
    let temples = [
        Rect::at(d / 4, d * 8 / 7).of_size((d / 2).max(1) as u32, (d / 2).max(1) as u32),
        Rect::at(d * 5 / 4, d * 8 / 7).of_size((d / 2).max(1) as u32, (d / 2).max(1) as u32),
    ];

    (
        edge_fraction(&mag, level, &bridge),
        edge_fraction(&mag, level, &temples),
    )
}

/// Fraction of above-level pixels over the union of `rois`, each clamped
/// to the image bounds. A fully clamped-away group divides by 1.
fn edge_fraction(mag: &GrayImage, level: u8, rois: &[Rect]) -> f32 {
    let mut hits = 0u32;
    let mut area = 0u32;
    for roi in rois {
        let Some(r) = clamp_rect(*roi, mag.width(), mag.height()) else {
            continue;
        };
        for y in r.top()..r.top() + r.height() as i32 {
            for x in r.left()..r.left() + r.width() as i32 {
                if mag.get_pixel(x as u32, y as u32)[0] > level {
                    hits += 1;
                }
            }
        }
        area += r.width() * r.height();
    }
    hits as f32 / area.max(1) as f32
}

/// Intersect a rectangle with the image bounds; `None` if nothing is left.
fn clamp_rect(r: Rect, width: u32, height: u32) -> Option<Rect> {
    let x0 = r.left().max(0);
    let y0 = r.top().max(0);
    let x1 = (r.left() + r.width() as i32).min(width as i32);
    let y1 = (r.top() + r.height() as i32).min(height as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

/// Crop the narrow vertical strip through the nose bridge: centered
/// horizontally, spanning the configured fraction of the height below the
/// eye line.
fn bridge_strip(gray: &GrayImage) -> Option<GrayImage> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let strip_w = ((w as f32 * STRIP_WIDTH_FRACTION).round() as u32).clamp(1, w);
    let y0 = (h as f32 * STRIP_TOP_FRACTION) as u32;
    let y1 = ((h as f32 * STRIP_BOTTOM_FRACTION) as u32).min(h);
    if y1 <= y0 {
        return None;
    }
    let x0 = (w - strip_w) / 2;
    Some(image::imageops::crop_imm(gray, x0, y0, strip_w, y1 - y0).to_image())
}

/// Count center-column rows whose vertical gradient (row below minus row
/// above, after a 3x3 box blur) exceeds the fixed threshold, normalized
/// by the number of interior rows.
fn bridge_gradient_measure(face: &DynamicImage) -> f32 {
    let gray = face.to_luma8();
    let Some(strip) = bridge_strip(&gray) else {
        return 0.0;
    };
    let blurred = box_filter(&strip, 1, 1);
    let rows = blurred.height();
    if rows < 3 {
        return 0.0;
    }
    let col = blurred.width() / 2;
    let mut hits = 0u32;
    for y in 1..rows - 1 {
        let above = blurred.get_pixel(col, y - 1)[0] as i16;
        let below = blurred.get_pixel(col, y + 1)[0] as i16;
        if (below - above).abs() > STRIP_GRADIENT_THRESHOLD {
            hits += 1;
        }
    }
    hits as f32 / (rows - 2).max(1) as f32
}

/// Fraction of Canny edge pixels along the strip's center column. Paired
/// with a zero threshold this makes any edge pixel count as glasses.
fn bridge_canny_measure(face: &DynamicImage) -> f32 {
    let gray = face.to_luma8();
    let Some(strip) = bridge_strip(&gray) else {
        return 0.0;
    };
    let edges = canny(&strip, CANNY_LOW, CANNY_HIGH);
    let h = edges.height();
    if h == 0 {
        return 0.0;
    }
    let col = edges.width() / 2;
    let hits = (0..h).filter(|&y| edges.get_pixel(col, y)[0] > 0).count();
    hits as f32 / h as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_round_trips_through_str() {
        for s in [Strategy::SobelOtsu, Strategy::Bridge, Strategy::BridgeCanny] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
        assert!("pixel-count".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_default_thresholds_per_strategy() {
        assert!(Strategy::SobelOtsu.default_threshold() > 0.0);
        assert!(Strategy::Bridge.default_threshold() > 0.0);
        assert_eq!(Strategy::BridgeCanny.default_threshold(), 0.0);
    }

    #[test]
    fn test_clamp_rect_inside_and_outside() {
        let r = clamp_rect(Rect::at(-10, -10).of_size(20, 20), 100, 100).unwrap();
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (0, 0, 10, 10));
        assert!(clamp_rect(Rect::at(200, 200).of_size(20, 20), 100, 100).is_none());
    }

    #[test]
    fn test_all_strategies_zero_on_black() {
        let black = DynamicImage::new_rgb8(256, 256);
        for s in [Strategy::SobelOtsu, Strategy::Bridge, Strategy::BridgeCanny] {
            assert_eq!(s.measure(&black), 0.0, "strategy {s}");
        }
    }

    #[test]
    fn test_tiny_image_does_not_divide_by_zero() {
        let tiny = DynamicImage::new_rgb8(2, 2);
        for s in [Strategy::SobelOtsu, Strategy::Bridge, Strategy::BridgeCanny] {
            let m = s.measure(&tiny);
            assert!(m.is_finite());
            assert!(m >= 0.0);
        }
    }

    #[test]
    fn test_rgba_input_is_accepted() {
        let rgba = DynamicImage::new_rgba8(256, 256);
        assert_eq!(Strategy::SobelOtsu.measure(&rgba), 0.0);
    }
}
