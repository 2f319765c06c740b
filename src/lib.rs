pub mod batch;
pub mod config;
pub mod report;

// Re-export vision types for convenience
pub use glint_vision::{
    detect_glasses, DetectOptions, FrameStream, LandmarkSet, SmoothingWindow, Strategy, Verdict,
};
