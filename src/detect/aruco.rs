//! OpenCV ArUco detector backend.

use anyhow::{Context, Result};
use opencv::core::{Mat, Point2f, Vector};
use opencv::objdetect::{
    self, ArucoDetector, DetectorParameters, PredefinedDictionaryType, RefineParameters,
};
use opencv::prelude::*;

use crate::config::{DetectionConfig, DictSize, MaxId};
use crate::detect::{DictKey, MarkerDetector, MarkerHit};

/// Marker detector backed by OpenCV's predefined ArUco dictionaries.
///
/// The underlying detector object is bound to one dictionary, so it is
/// rebuilt whenever the keyboard controls select a different one and reused
/// for every frame in between.
pub struct ArucoBackend {
    detector: ArucoDetector,
    active: DictKey,
}

impl ArucoBackend {
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let active = config.dict_key();
        let detector = build_detector(active)?;
        Ok(Self { detector, active })
    }
}

impl MarkerDetector for ArucoBackend {
    fn name(&self) -> &'static str {
        "opencv-aruco"
    }

    fn detect(&mut self, frame: &Mat, config: &DetectionConfig) -> Result<Vec<MarkerHit>> {
        let wanted = config.dict_key();
        if wanted != self.active {
            self.detector = build_detector(wanted)?;
            self.active = wanted;
            log::info!(
                "detector switched to dictionary {}:{}",
                wanted.size.label(),
                wanted.max_id.label()
            );
        }

        let mut corners = Vector::<Vector<Point2f>>::new();
        let mut ids = Vector::<i32>::new();
        let mut rejected = Vector::<Vector<Point2f>>::new();
        self.detector
            .detect_markers(frame, &mut corners, &mut ids, &mut rejected)
            .context("marker detection failed")?;

        let mut hits = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let quad = corners.get(index)?;
            if quad.len() != 4 {
                log::warn!("marker {} reported {} corners, skipping", id, quad.len());
                continue;
            }
            hits.push(MarkerHit {
                id,
                corners: [quad.get(0)?, quad.get(1)?, quad.get(2)?, quad.get(3)?],
            });
        }
        Ok(hits)
    }
}

fn build_detector(key: DictKey) -> Result<ArucoDetector> {
    let dictionary = objdetect::get_predefined_dictionary(predefined_dictionary(key))
        .context("failed to load predefined dictionary")?;
    let parameters =
        DetectorParameters::default().context("failed to build detector parameters")?;
    let refine = RefineParameters::new(10.0, 3.0, true)?;
    ArucoDetector::new(&dictionary, &parameters, refine).context("failed to build ArUco detector")
}

fn predefined_dictionary(key: DictKey) -> PredefinedDictionaryType {
    use PredefinedDictionaryType::*;
    match (key.size, key.max_id) {
        (DictSize::Bits4x4, MaxId::Ids50) => DICT_4X4_50,
        (DictSize::Bits4x4, MaxId::Ids100) => DICT_4X4_100,
        (DictSize::Bits4x4, MaxId::Ids250) => DICT_4X4_250,
        (DictSize::Bits4x4, MaxId::Ids1000) => DICT_4X4_1000,
        (DictSize::Bits5x5, MaxId::Ids50) => DICT_5X5_50,
        (DictSize::Bits5x5, MaxId::Ids100) => DICT_5X5_100,
        (DictSize::Bits5x5, MaxId::Ids250) => DICT_5X5_250,
        (DictSize::Bits5x5, MaxId::Ids1000) => DICT_5X5_1000,
        (DictSize::Bits6x6, MaxId::Ids50) => DICT_6X6_50,
        (DictSize::Bits6x6, MaxId::Ids100) => DICT_6X6_100,
        (DictSize::Bits6x6, MaxId::Ids250) => DICT_6X6_250,
        (DictSize::Bits6x6, MaxId::Ids1000) => DICT_6X6_1000,
        (DictSize::Bits7x7, MaxId::Ids50) => DICT_7X7_50,
        (DictSize::Bits7x7, MaxId::Ids100) => DICT_7X7_100,
        (DictSize::Bits7x7, MaxId::Ids250) => DICT_7X7_250,
        (DictSize::Bits7x7, MaxId::Ids1000) => DICT_7X7_1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    fn key(size: DictSize, max_id: MaxId) -> DictKey {
        DictKey { size, max_id }
    }

    #[test]
    fn dictionary_mapping_covers_grid_corners() {
        assert_eq!(
            predefined_dictionary(key(DictSize::Bits4x4, MaxId::Ids50)),
            PredefinedDictionaryType::DICT_4X4_50
        );
        assert_eq!(
            predefined_dictionary(key(DictSize::Bits4x4, MaxId::Ids1000)),
            PredefinedDictionaryType::DICT_4X4_1000
        );
        assert_eq!(
            predefined_dictionary(key(DictSize::Bits6x6, MaxId::Ids250)),
            PredefinedDictionaryType::DICT_6X6_250
        );
        assert_eq!(
            predefined_dictionary(key(DictSize::Bits7x7, MaxId::Ids50)),
            PredefinedDictionaryType::DICT_7X7_50
        );
        assert_eq!(
            predefined_dictionary(key(DictSize::Bits7x7, MaxId::Ids1000)),
            PredefinedDictionaryType::DICT_7X7_1000
        );
    }

    #[test]
    fn blank_frame_yields_no_hits() {
        let config = DetectionConfig::default();
        let mut backend = ArucoBackend::new(&config).expect("backend");
        let frame = Mat::new_rows_cols_with_default(96, 96, CV_8UC3, Scalar::all(255.0))
            .expect("blank frame");
        let hits = backend.detect(&frame, &config).expect("detect");
        assert!(hits.is_empty());
    }

    #[test]
    fn detector_rebuilds_when_dictionary_changes() {
        let mut config = DetectionConfig::default();
        let mut backend = ArucoBackend::new(&config).expect("backend");
        let frame = Mat::new_rows_cols_with_default(64, 64, CV_8UC3, Scalar::all(255.0))
            .expect("blank frame");

        backend.detect(&frame, &config).expect("detect");
        assert_eq!(backend.active, config.dict_key());

        config.cycle_dict_size();
        config.cycle_max_id();
        backend.detect(&frame, &config).expect("detect");
        assert_eq!(backend.active, config.dict_key());
    }
}
