//! Provider-tagged landmark sets and eye-corner resolution.
//!
//! Downstream geometry only ever needs four canonical eye-corner points;
//! this module is the only place that knows provider indexing schemes.
//! Adding a provider means adding one arm to [`eye_corners`].

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::{EyeCorners, Point};

pub const PROVIDER_MEDIAPIPE: &str = "mediapipe";
pub const PROVIDER_FACEAPI: &str = "faceapi";

/// Eye-corner indices in the dense-mesh ("mediapipe") scheme,
/// approximating the outer/inner canthus of each eye.
const MESH_RIGHT_OUTER: usize = 33;
const MESH_RIGHT_INNER: usize = 133;
const MESH_LEFT_INNER: usize = 362;
const MESH_LEFT_OUTER: usize = 263;

/// Eye-corner indices in the 68-point ("faceapi") scheme.
const P68_RIGHT_OUTER: usize = 36;
const P68_RIGHT_INNER: usize = 39;
const P68_LEFT_INNER: usize = 42;
const P68_LEFT_OUTER: usize = 45;

/// One keypoint, accepted either as a `[x, y]` pair or as a named
/// `{"x": .., "y": ..}` object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum LandmarkPoint {
    Pair([f32; 2]),
    Named { x: f32, y: f32 },
}

impl LandmarkPoint {
    fn xy(self) -> (f32, f32) {
        match self {
            LandmarkPoint::Pair([x, y]) => (x, y),
            LandmarkPoint::Named { x, y } => (x, y),
        }
    }
}

/// A provider-tagged set of facial keypoints, as produced by an external
/// landmark detector. Mediapipe sets carry normalized [0,1] coordinates,
/// faceapi sets carry pixel coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkSet {
    pub provider: String,
    pub points: Vec<LandmarkPoint>,
}

/// Resolve the four canonical eye corners in image pixel space.
pub fn eye_corners(set: &LandmarkSet, width: u32, height: u32) -> Result<EyeCorners> {
    match set.provider.as_str() {
        PROVIDER_MEDIAPIPE => {
            let scale = |idx: usize| -> Result<Point> {
                let (x, y) = point_at(set, PROVIDER_MEDIAPIPE, idx)?;
                Ok(Point::new(x * width as f32, y * height as f32))
            };
            Ok(EyeCorners {
                right_outer: scale(MESH_RIGHT_OUTER)?,
                right_inner: scale(MESH_RIGHT_INNER)?,
                left_inner: scale(MESH_LEFT_INNER)?,
                left_outer: scale(MESH_LEFT_OUTER)?,
            })
        }
        PROVIDER_FACEAPI => {
            let pixel = |idx: usize| -> Result<Point> {
                let (x, y) = point_at(set, PROVIDER_FACEAPI, idx)?;
                Ok(Point::new(x, y))
            };
            Ok(EyeCorners {
                right_outer: pixel(P68_RIGHT_OUTER)?,
                right_inner: pixel(P68_RIGHT_INNER)?,
                left_inner: pixel(P68_LEFT_INNER)?,
                left_outer: pixel(P68_LEFT_OUTER)?,
            })
        }
        other => Err(Error::UnsupportedProvider(other.to_string())),
    }
}

fn point_at(set: &LandmarkSet, provider: &'static str, index: usize) -> Result<(f32, f32)> {
    set.points
        .get(index)
        .copied()
        .map(LandmarkPoint::xy)
        .ok_or(Error::MissingLandmark {
            provider,
            index,
            len: set.points.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_set(len: usize) -> LandmarkSet {
        LandmarkSet {
            provider: PROVIDER_MEDIAPIPE.to_string(),
            points: vec![LandmarkPoint::Pair([0.5, 0.5]); len],
        }
    }

    #[test]
    fn test_mediapipe_scales_normalized_coordinates() {
        let set = mesh_set(400);
        let corners = eye_corners(&set, 100, 200).unwrap();
        assert_eq!(corners.right_outer, Point::new(50.0, 100.0));
        assert_eq!(corners.left_outer, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_faceapi_reads_pixel_coordinates() {
        let mut points = vec![LandmarkPoint::Pair([0.0, 0.0]); 68];
        points[P68_RIGHT_OUTER] = LandmarkPoint::Pair([100.0, 100.0]);
        points[P68_RIGHT_INNER] = LandmarkPoint::Named { x: 140.0, y: 100.0 };
        points[P68_LEFT_INNER] = LandmarkPoint::Pair([200.0, 100.0]);
        points[P68_LEFT_OUTER] = LandmarkPoint::Named { x: 240.0, y: 100.0 };
        let set = LandmarkSet {
            provider: PROVIDER_FACEAPI.to_string(),
            points,
        };
        let corners = eye_corners(&set, 640, 480).unwrap();
        assert_eq!(corners.right_inner, Point::new(140.0, 100.0));
        assert_eq!(corners.left_outer, Point::new(240.0, 100.0));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let set = LandmarkSet {
            provider: "dlib".to_string(),
            points: vec![],
        };
        match eye_corners(&set, 640, 480) {
            Err(Error::UnsupportedProvider(p)) => assert_eq!(p, "dlib"),
            other => panic!("expected UnsupportedProvider, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_landmark_is_reported() {
        // 68-point set truncated below the left-eye indices
        let set = LandmarkSet {
            provider: PROVIDER_FACEAPI.to_string(),
            points: vec![LandmarkPoint::Pair([0.0, 0.0]); 40],
        };
        match eye_corners(&set, 640, 480) {
            Err(Error::MissingLandmark { index, len, .. }) => {
                assert_eq!(index, P68_LEFT_INNER);
                assert_eq!(len, 40);
            }
            other => panic!("expected MissingLandmark, got {:?}", other),
        }
    }

    #[test]
    fn test_point_wire_formats() {
        let raw = r#"{
            "provider": "faceapi",
            "points": [[1.0, 2.0], {"x": 3.0, "y": 4.0}]
        }"#;
        let set: LandmarkSet = serde_json::from_str(raw).unwrap();
        assert_eq!(set.points.len(), 2);
        assert_eq!(set.points[0].xy(), (1.0, 2.0));
        assert_eq!(set.points[1].xy(), (3.0, 4.0));
    }
}
