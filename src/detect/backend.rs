use anyhow::Result;
use opencv::core::Mat;

use crate::config::{DetectionConfig, DictSize, MaxId};
use crate::detect::MarkerHit;

/// Dictionary selection consumed by detector backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DictKey {
    pub size: DictSize,
    pub max_id: MaxId,
}

/// Marker detector seam.
///
/// The production backend wraps the external detection library; loop tests
/// drive the frame loop with a scripted stand-in instead.
pub trait MarkerDetector {
    /// Backend identifier used in log lines.
    fn name(&self) -> &'static str;

    /// Locate markers in one frame using the active dictionary selection.
    fn detect(&mut self, frame: &Mat, config: &DetectionConfig) -> Result<Vec<MarkerHit>>;
}
