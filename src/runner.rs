//! Frame loop.
//!
//! Drives one pass over a source: read a frame, detect markers on it at
//! native resolution, render the overlay onto a scaled display copy and
//! hand it to the presenter. Keyboard actions mutate the detection
//! settings between iterations.
//!
//! The loop is responsible for:
//! - Stopping when the source runs out, a quit key arrives or the
//!   shutdown flag is raised
//! - Treating mid-stream read errors as end of stream
//! - Releasing the source and presenter on every exit path
//!
//! The loop MUST NOT:
//! - Exit the process (callers decide what an outcome means)
//! - Reopen or retry a failed source

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use opencv::prelude::*;

use crate::config::DetectionConfig;
use crate::detect::MarkerDetector;
use crate::display::{format_status, KeyAction, Presenter};
use crate::overlay;
use crate::source::{FrameSource, SourceKind};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);
/// Key-poll wait for a repeated still image, long enough to avoid a busy
/// spin over identical frames.
const IMAGE_WAIT_MS: i32 = 30;
const LIVE_WAIT_MS: i32 = 1;
const SEEK_STEP_SECONDS: f64 = 5.0;

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    QuitKey,
    Interrupted,
}

/// Summary of one finished loop.
#[derive(Clone, Debug)]
pub struct LoopOutcome {
    pub frames: u64,
    pub markers: u64,
    pub reason: StopReason,
}

/// Run the frame loop to completion.
///
/// Returns the outcome of a normal stop; errors mean the loop itself broke
/// (detector or presenter failure), not that the source ran out.
pub fn run_loop(
    source: &mut dyn FrameSource,
    detector: &mut dyn MarkerDetector,
    presenter: &mut dyn Presenter,
    config: &mut DetectionConfig,
    shutdown: &AtomicBool,
) -> Result<LoopOutcome> {
    let outcome = drive(source, detector, presenter, config, shutdown);

    // Cleanup runs on success and failure alike.
    if let Err(error) = source.release() {
        log::warn!("source release failed: {}", error);
    }
    if let Err(error) = presenter.close() {
        log::warn!("presenter close failed: {}", error);
    }
    outcome
}

fn drive(
    source: &mut dyn FrameSource,
    detector: &mut dyn MarkerDetector,
    presenter: &mut dyn Presenter,
    config: &mut DetectionConfig,
    shutdown: &AtomicBool,
) -> Result<LoopOutcome> {
    let wait_ms = match source.kind() {
        SourceKind::Image => IMAGE_WAIT_MS,
        _ => LIVE_WAIT_MS,
    };

    let mut frames: u64 = 0;
    let mut markers: u64 = 0;
    let mut last_health_log = Instant::now();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            log::info!("shutdown requested, stopping frame loop");
            return Ok(LoopOutcome {
                frames,
                markers,
                reason: StopReason::Interrupted,
            });
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Ok(LoopOutcome {
                    frames,
                    markers,
                    reason: StopReason::SourceExhausted,
                });
            }
            Err(error) => {
                log::warn!("source read failed, treating as end of stream: {}", error);
                return Ok(LoopOutcome {
                    frames,
                    markers,
                    reason: StopReason::SourceExhausted,
                });
            }
        };
        frames += 1;

        let hits = detector.detect(&frame, config)?;
        markers += hits.len() as u64;

        let scale = config.scale_factor(frame.cols(), frame.rows());
        let mut display_frame = overlay::scale_for_display(frame, scale)?;
        overlay::draw_hits(&mut display_frame, &hits, scale)?;
        let status = format_status(config, hits.len(), source.position());
        let display_frame = overlay::append_status_bar(&display_frame, &status)?;

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "loop health: frames={} markers={} dict={} display={}px",
                frames,
                markers,
                config.dict_label(),
                config.display_px
            );
            last_health_log = Instant::now();
        }

        match presenter.present(&display_frame, wait_ms)? {
            Some(KeyAction::Quit) => {
                log::info!("quit key pressed");
                return Ok(LoopOutcome {
                    frames,
                    markers,
                    reason: StopReason::QuitKey,
                });
            }
            Some(KeyAction::GrowDisplay) => config.grow_display(),
            Some(KeyAction::ShrinkDisplay) => config.shrink_display(),
            Some(KeyAction::CycleDictSize) => {
                config.cycle_dict_size();
                log::info!("dictionary set to {}", config.dict_label());
            }
            Some(KeyAction::CycleMaxIds) => {
                config.cycle_max_id();
                log::info!("dictionary set to {}", config.dict_label());
            }
            Some(KeyAction::SeekBack) => seek(source, -SEEK_STEP_SECONDS)?,
            Some(KeyAction::SeekForward) => seek(source, SEEK_STEP_SECONDS)?,
            None => {}
        }
    }
}

fn seek(source: &mut dyn FrameSource, seconds: f64) -> Result<()> {
    if !source.seek_by_seconds(seconds)? {
        log::debug!("{} source does not support seeking", source.kind().label());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubDetector;
    use crate::display::StubPresenter;
    use crate::source::StubSource;

    fn run(
        source: &mut StubSource,
        detector: &mut StubDetector,
        presenter: &mut StubPresenter,
        config: &mut DetectionConfig,
    ) -> LoopOutcome {
        let shutdown = AtomicBool::new(false);
        run_loop(source, detector, presenter, config, &shutdown).expect("loop")
    }

    #[test]
    fn finite_source_terminates_on_exhaustion() {
        let mut source = StubSource::finite(5);
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::new();
        let mut config = DetectionConfig::default();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.reason, StopReason::SourceExhausted);
        assert_eq!(outcome.frames, 5);
        assert_eq!(detector.frames_seen, 5);
        assert_eq!(presenter.frames_shown, 5);
        assert!(source.released);
        assert!(presenter.closed);
    }

    #[test]
    fn quit_key_stops_within_one_iteration() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::with_script([None, Some(KeyAction::Quit)]);
        let mut config = DetectionConfig::default();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.reason, StopReason::QuitKey);
        assert_eq!(outcome.frames, 2);
        assert_eq!(presenter.frames_shown, 2);
        assert!(source.released);
    }

    #[test]
    fn scale_keys_change_only_the_display_size() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::new();
        let mut presenter =
            StubPresenter::with_script([Some(KeyAction::GrowDisplay), Some(KeyAction::Quit)]);
        let mut config = DetectionConfig::default();
        let before = config.clone();

        run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(config.display_px, before.display_px + 50);
        assert_eq!(config.dict_size, before.dict_size);
        assert_eq!(config.max_id, before.max_id);

        // The frame after the key press is rendered at the new size. The
        // stub source is 64px wide, so 1050/64 scales it to 1050 columns.
        assert_eq!(presenter.last_frame_size.map(|(w, _)| w), Some(1050));
    }

    #[test]
    fn cycle_keys_change_only_the_dictionary() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::with_script([
            Some(KeyAction::CycleDictSize),
            Some(KeyAction::CycleMaxIds),
            Some(KeyAction::Quit),
        ]);
        let mut config = DetectionConfig::default();
        let before = config.clone();

        run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(config.dict_size, before.dict_size.cycled());
        assert_eq!(config.max_id, before.max_id.cycled());
        assert_eq!(config.display_px, before.display_px);
    }

    #[test]
    fn read_failure_ends_the_loop_gracefully() {
        let mut source = StubSource::failing_at(10, 3);
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::new();
        let mut config = DetectionConfig::default();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.reason, StopReason::SourceExhausted);
        assert_eq!(outcome.frames, 2);
        assert!(source.released);
        assert!(presenter.closed);
    }

    #[test]
    fn detector_failure_errors_out_but_still_cleans_up() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::failing_on(3);
        let mut presenter = StubPresenter::new();
        let mut config = DetectionConfig::default();
        let shutdown = AtomicBool::new(false);

        let result = run_loop(
            &mut source,
            &mut detector,
            &mut presenter,
            &mut config,
            &shutdown,
        );
        assert!(result.is_err());
        assert_eq!(detector.frames_seen, 3);
        assert_eq!(presenter.frames_shown, 2);
        assert!(source.released);
        assert!(presenter.closed);
    }

    #[test]
    fn seek_keys_move_a_seekable_source() {
        let mut source = StubSource::seekable(100);
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::with_script([
            Some(KeyAction::SeekForward),
            Some(KeyAction::SeekBack),
            Some(KeyAction::Quit),
        ]);
        let mut config = DetectionConfig::default();
        let before = config.clone();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.reason, StopReason::QuitKey);
        assert_eq!(source.seeks, vec![SEEK_STEP_SECONDS, -SEEK_STEP_SECONDS]);
        assert_eq!(config.display_px, before.display_px);
        assert_eq!(config.dict_size, before.dict_size);
        assert_eq!(config.max_id, before.max_id);
    }

    #[test]
    fn seek_keys_on_a_non_seekable_source_are_ignored() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::new();
        let mut presenter =
            StubPresenter::with_script([Some(KeyAction::SeekForward), Some(KeyAction::Quit)]);
        let mut config = DetectionConfig::default();
        let before = config.clone();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.reason, StopReason::QuitKey);
        assert_eq!(outcome.frames, 2);
        assert!(source.seeks.is_empty());
        assert_eq!(config.display_px, before.display_px);
    }

    #[test]
    fn preset_shutdown_flag_stops_before_reading() {
        let mut source = StubSource::endless();
        let mut detector = StubDetector::new();
        let mut presenter = StubPresenter::new();
        let mut config = DetectionConfig::default();
        let shutdown = AtomicBool::new(true);

        let outcome = run_loop(
            &mut source,
            &mut detector,
            &mut presenter,
            &mut config,
            &shutdown,
        )
        .expect("loop");
        assert_eq!(outcome.reason, StopReason::Interrupted);
        assert_eq!(outcome.frames, 0);
        assert_eq!(presenter.frames_shown, 0);
        assert!(source.released);
        assert!(presenter.closed);
    }

    #[test]
    fn detections_are_counted_across_frames() {
        let hits = vec![
            StubDetector::square_hit(3, 20.0, 20.0, 8.0),
            StubDetector::square_hit(9, 44.0, 28.0, 8.0),
        ];
        let mut source = StubSource::finite(3);
        let mut detector = StubDetector::with_hits(hits);
        let mut presenter = StubPresenter::new();
        let mut config = DetectionConfig::default();

        let outcome = run(&mut source, &mut detector, &mut presenter, &mut config);
        assert_eq!(outcome.frames, 3);
        assert_eq!(outcome.markers, 6);
    }
}
