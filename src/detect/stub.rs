use anyhow::{bail, Result};
use opencv::core::{Mat, Point2f};

use crate::config::DetectionConfig;
use crate::detect::{MarkerDetector, MarkerHit};

/// Scripted detector for loop tests. Returns the same hits for every frame
/// and counts how many frames it saw.
pub struct StubDetector {
    hits: Vec<MarkerHit>,
    fail_on: Option<u64>,
    pub frames_seen: u64,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            fail_on: None,
            frames_seen: 0,
        }
    }

    pub fn with_hits(hits: Vec<MarkerHit>) -> Self {
        Self {
            hits,
            ..Self::new()
        }
    }

    /// Detector that errors on the nth detect call (1-based).
    pub fn failing_on(call: u64) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new()
        }
    }

    /// Axis-aligned square hit centered on (cx, cy), for test scripts.
    pub fn square_hit(id: i32, cx: f32, cy: f32, half_side: f32) -> MarkerHit {
        MarkerHit {
            id,
            corners: [
                Point2f::new(cx - half_side, cy - half_side),
                Point2f::new(cx + half_side, cy - half_side),
                Point2f::new(cx + half_side, cy + half_side),
                Point2f::new(cx - half_side, cy + half_side),
            ],
        }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Mat, _config: &DetectionConfig) -> Result<Vec<MarkerHit>> {
        self.frames_seen += 1;
        if self.fail_on == Some(self.frames_seen) {
            bail!("injected detector failure on call {}", self.frames_seen);
        }
        Ok(self.hits.clone())
    }
}
