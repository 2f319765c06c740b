pub mod align;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod measure;
pub mod pipeline;
pub mod smoothing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use geometry::{EyeCenters, EyeCorners, Line, Point};
pub use landmarks::{LandmarkPoint, LandmarkSet};
pub use measure::Strategy;
pub use pipeline::{detect_glasses, DetectOptions, Verdict};
pub use smoothing::{FrameStream, SmoothingWindow};
