//! Eye-based face alignment into a fixed-size canonical crop.

use image::{DynamicImage, GenericImageView, RgbImage};

use crate::geometry::EyeCenters;

/// Default output edge length.
pub const DEFAULT_ALIGN_SIZE: u32 = 256;

/// Fraction of the output width spanned by the inter-eye distance.
pub const EYE_SPAN_FRACTION: f32 = 0.5;

/// Align and crop the face: the eye line becomes level, the eye midpoint
/// lands on the output center and the inter-eye distance spans
/// [`EYE_SPAN_FRACTION`] of the output width. The output is a freshly
/// allocated `size`x`size` image; samples falling outside the source stay
/// black. The source is read-only and may be 3- or 4-channel.
pub fn align_face(img: &DynamicImage, eyes: &EyeCenters, size: u32) -> RgbImage {
    let right = eyes.right;
    let left = eyes.left;

    // Rotation levels the right->left eye vector
    let eye_dx = left.x - right.x;
    let eye_dy = left.y - right.y;
    let eye_angle = eye_dy.atan2(eye_dx);

    // Degenerate eye distance degrades to 1 instead of dividing by zero
    let mut eye_dist = (eye_dx * eye_dx + eye_dy * eye_dy).sqrt();
    if !eye_dist.is_finite() || eye_dist <= f32::EPSILON {
        eye_dist = 1.0;
    }
    let scale = (size as f32 * EYE_SPAN_FRACTION) / eye_dist;

    let eye_center = ((right.x + left.x) / 2.0, (right.y + left.y) / 2.0);
    let out_center = (size as f32 / 2.0, size as f32 / 2.0);

    // Build affine transform matrix (3x2)
    // [ a  b  tx ]
    // [ c  d  ty ]
    // Where output = [a,b; c,d] * input + [tx, ty]
    let cos_angle = eye_angle.cos();
    let sin_angle = eye_angle.sin();
    let a = scale * cos_angle;
    let b = scale * sin_angle;
    let c = -scale * sin_angle;
    let d = scale * cos_angle;

    // Translation: after rotation and scaling, shift so the eye midpoint
    // maps to the output center
    let tx = out_center.0 - (a * eye_center.0 + b * eye_center.1);
    let ty = out_center.1 - (c * eye_center.0 + d * eye_center.1);

    let (img_w, img_h) = img.dimensions();
    let mut output = RgbImage::new(size, size);

    // For each pixel in output, find the corresponding source pixel
    let det = a * d - b * c;
    for out_y in 0..size {
        for out_x in 0..size {
            // Invert the transformation to find source coordinates
            let tmp_x = out_x as f32 - tx;
            let tmp_y = out_y as f32 - ty;
            let in_x = (d * tmp_x - b * tmp_y) / det;
            let in_y = (-c * tmp_x + a * tmp_y) / det;

            // Sample from the source image (with boundary check)
            if in_x >= 0.0 && in_x < img_w as f32 && in_y >= 0.0 && in_y < img_h as f32 {
                // Bilinear interpolation
                let x0 = in_x.floor() as u32;
                let y0 = in_y.floor() as u32;
                let x1 = (x0 + 1).min(img_w - 1);
                let y1 = (y0 + 1).min(img_h - 1);

                let fx = in_x - x0 as f32;
                let fy = in_y - y0 as f32;

                let p00 = img.get_pixel(x0, y0);
                let p10 = img.get_pixel(x1, y0);
                let p01 = img.get_pixel(x0, y1);
                let p11 = img.get_pixel(x1, y1);

                let w00 = (1.0 - fx) * (1.0 - fy);
                let w10 = fx * (1.0 - fy);
                let w01 = (1.0 - fx) * fy;
                let w11 = fx * fy;

                let r = (p00[0] as f32 * w00
                    + p10[0] as f32 * w10
                    + p01[0] as f32 * w01
                    + p11[0] as f32 * w11) as u8;
                let g = (p00[1] as f32 * w00
                    + p10[1] as f32 * w10
                    + p01[1] as f32 * w01
                    + p11[1] as f32 * w11) as u8;
                let b_val = (p00[2] as f32 * w00
                    + p10[2] as f32 * w10
                    + p01[2] as f32 * w01
                    + p11[2] as f32 * w11) as u8;

                output.put_pixel(out_x, out_y, image::Rgb([r, g, b_val]));
            }
            // else: leave black (default)
        }
    }

    output
}
