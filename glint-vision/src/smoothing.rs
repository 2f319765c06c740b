//! Temporal smoothing for streaming detection.
//!
//! Each logical stream owns exactly one window; the core itself stays
//! stateless, so independent streams never share state.

use std::collections::VecDeque;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::landmarks::LandmarkSet;
use crate::pipeline::{detect_glasses, DetectOptions, Verdict};

/// Default number of recent measures kept per stream.
pub const DEFAULT_WINDOW: usize = 7;

/// Bounded FIFO of recent measures with a moving-average read-out.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SmoothingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, measure: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(measure);
    }

    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// One logical video stream: the detection options plus the stream-owned
/// smoothing window.
pub struct FrameStream {
    opts: DetectOptions,
    window: SmoothingWindow,
}

impl FrameStream {
    pub fn new(opts: DetectOptions) -> Self {
        Self {
            opts,
            window: SmoothingWindow::default(),
        }
    }

    pub fn with_window(opts: DetectOptions, capacity: usize) -> Self {
        Self {
            opts,
            window: SmoothingWindow::new(capacity),
        }
    }

    /// Process one frame and return the smoothed verdict.
    ///
    /// `landmarks` is `None` when the external detector found no face.
    /// Any frame without a valid measure (no face, missing keypoint,
    /// gate rejection) clears the window so stale measures never survive
    /// a lost track.
    pub fn frame(&mut self, landmarks: Option<&LandmarkSet>, img: &DynamicImage) -> Result<Verdict> {
        let Some(set) = landmarks else {
            self.lost_track("no face");
            return Ok(Verdict::none());
        };

        let verdict = match detect_glasses(set, img, &self.opts) {
            Ok(v) => v,
            // A keypoint missing from one frame is a failed detection,
            // not a broken stream
            Err(Error::MissingLandmark { .. }) => {
                self.lost_track("missing landmark");
                return Ok(Verdict::none());
            }
            Err(e) => return Err(e),
        };
        if !verdict.is_valid() {
            self.lost_track("gate rejection");
            return Ok(verdict);
        }

        self.window.push(verdict.measure);
        let smoothed = self.window.mean().unwrap_or(verdict.measure);
        Ok(Verdict {
            measure: smoothed,
            with_glasses: crate::pipeline::classify(smoothed, self.opts.resolved_threshold()),
        })
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    fn lost_track(&mut self, cause: &str) {
        if !self.window.is_empty() {
            log::debug!("track lost ({cause}), dropping {} measures", self.window.len());
        }
        self.window.reset();
    }
}
