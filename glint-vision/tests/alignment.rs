use anyhow::Result;
use glint_vision::align::{self, DEFAULT_ALIGN_SIZE};
use glint_vision::geometry::{EyeCenters, Point};
use image::{DynamicImage, Rgb, RgbImage};

/// Deterministic test pattern so misplaced sampling shows up as a diff.
fn pattern_image(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    })
}

fn draw_disk(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Eyes already level, centered and at the target spacing: the transform
/// is the identity and the output equals a direct crop of the source.
#[test]
fn test_identity_alignment_is_a_direct_crop() -> Result<()> {
    let size = DEFAULT_ALIGN_SIZE;
    let source = pattern_image(size);
    let img = DynamicImage::ImageRgb8(source.clone());
    // Spacing = size/2, midpoint = image center
    let eyes = EyeCenters {
        right: Point::new(size as f32 / 4.0, size as f32 / 2.0),
        left: Point::new(3.0 * size as f32 / 4.0, size as f32 / 2.0),
    };

    let aligned = align::align_face(&img, &eyes, size);

    assert_eq!(aligned.dimensions(), (size, size));
    for y in 0..size {
        for x in 0..size {
            assert_eq!(
                aligned.get_pixel(x, y),
                source.get_pixel(x, y),
                "pixel ({x}, {y}) changed under the identity transform"
            );
        }
    }
    Ok(())
}

/// Tilted eyes: after alignment both eye centers must land on the level
/// canonical positions (size/2 -/+ size/4, size/2).
#[test]
fn test_tilted_eyes_land_on_canonical_positions() -> Result<()> {
    let mut source = RgbImage::new(512, 512);
    let white = Rgb([255u8, 255, 255]);
    let eyes = EyeCenters {
        right: Point::new(180.0, 200.0),
        left: Point::new(320.0, 280.0),
    };
    draw_disk(&mut source, 180, 200, 12, white);
    draw_disk(&mut source, 320, 280, 12, white);

    let aligned = align::align_face(&DynamicImage::ImageRgb8(source), &eyes, 256);

    // Canonical eye positions for a 256 output
    for (cx, cy) in [(64u32, 128u32), (192, 128)] {
        let p = aligned.get_pixel(cx, cy);
        assert!(
            p[0] > 200,
            "expected a bright eye marker at ({cx}, {cy}), got {:?}",
            p
        );
    }
    Ok(())
}

/// Samples that fall outside the source stay black.
#[test]
fn test_out_of_bounds_samples_stay_black() -> Result<()> {
    // All-white tiny source; eyes near the top-left corner so most of the
    // output window reaches outside the source
    let source = RgbImage::from_pixel(64, 64, Rgb([255u8, 255, 255]));
    let eyes = EyeCenters {
        right: Point::new(8.0, 8.0),
        left: Point::new(56.0, 8.0),
    };

    let aligned = align::align_face(&DynamicImage::ImageRgb8(source), &eyes, 256);

    // The top edge of the output maps above the source
    let top = aligned.get_pixel(128, 0);
    assert_eq!(top, &Rgb([0u8, 0, 0]));
    // While the eye midpoint itself maps to white source content
    let center = aligned.get_pixel(128, 128);
    assert_eq!(center, &Rgb([255u8, 255, 255]));
    Ok(())
}

/// Two calls never alias: mutating one output leaves the other intact.
#[test]
fn test_outputs_are_independent_allocations() -> Result<()> {
    let img = DynamicImage::ImageRgb8(pattern_image(128));
    let eyes = EyeCenters {
        right: Point::new(32.0, 64.0),
        left: Point::new(96.0, 64.0),
    };
    let first = align::align_face(&img, &eyes, 128);
    let mut second = align::align_face(&img, &eyes, 128);
    second.put_pixel(0, 0, Rgb([1u8, 2, 3]));
    assert_ne!(first.get_pixel(0, 0), second.get_pixel(0, 0));
    Ok(())
}
