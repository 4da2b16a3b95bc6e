//! Live stream source, covering webcams and network URLs.
//!
//! Streaming captures buffer frames internally, so a naive read falls
//! further behind real time on every slow iteration. Reads here are timed:
//! a grab that returns almost instantly pulled a buffered frame, so
//! grabbing continues until one had to wait for the sensor. On open the
//! accumulated buffer is drained the same way, using the stream's own
//! frame interval as the threshold.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::{FrameSource, SourceKind};

/// Grabs faster than this are treated as buffered frames.
const MIN_LIVE_GRAB_MS: u128 = 10;
/// Upper bound on frames discarded in one drain pass.
const MAX_DRAIN_FRAMES: u32 = 300;
/// Fraction of the frame interval a live grab is expected to take.
const DRAIN_INTERVAL_FRACTION: f64 = 0.85;
const FALLBACK_FPS: f64 = 30.0;

pub struct StreamSource {
    cap: VideoCapture,
    kind: SourceKind,
    label: String,
    frames_read: u64,
}

impl StreamSource {
    pub fn open_device(index: i32) -> Result<Self> {
        let cap = VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("failed to open webcam {}", index))?;
        Self::from_capture(cap, SourceKind::Webcam, format!("webcam {}", index))
    }

    pub fn open_url(url: &str) -> Result<Self> {
        let cap = VideoCapture::from_file(url, videoio::CAP_ANY)
            .with_context(|| format!("failed to open stream {}", url))?;
        Self::from_capture(cap, SourceKind::Stream, url.to_string())
    }

    fn from_capture(cap: VideoCapture, kind: SourceKind, label: String) -> Result<Self> {
        if !cap.is_opened()? {
            bail!("unable to open video source {}", label);
        }

        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i64;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i64;
        log::info!("{} ready ({}x{})", label, width, height);

        let mut source = Self {
            cap,
            kind,
            label,
            frames_read: 0,
        };
        let drained = source.drain_buffered_frames(MAX_DRAIN_FRAMES)?;
        if drained > 0 {
            log::info!("drained {} buffered frames from {}", drained, source.label);
        }
        Ok(source)
    }

    /// Discard frames until one takes a realistic fraction of the frame
    /// interval to arrive, meaning the capture buffer is empty.
    fn drain_buffered_frames(&mut self, max_frames: u32) -> Result<u32> {
        let fps = match self.cap.get(videoio::CAP_PROP_FPS) {
            Ok(fps) if fps > 0.0 => fps,
            _ => FALLBACK_FPS,
        };
        let threshold_ms = (DRAIN_INTERVAL_FRACTION * 1000.0 / fps).round() as u128;
        let threshold_ms = threshold_ms.max(MIN_LIVE_GRAB_MS);

        let mut drained = 0;
        for _ in 0..max_frames {
            let started = Instant::now();
            if !self.cap.grab()? {
                bail!("{} produced no frames while draining", self.label);
            }
            if started.elapsed().as_millis() >= threshold_ms {
                break;
            }
            drained += 1;
        }
        Ok(drained)
    }
}

impl FrameSource for StreamSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        // Keep only a grab that had to wait on the sensor; instant grabs
        // return stale frames from the capture buffer.
        let mut grabbed;
        loop {
            let started = Instant::now();
            grabbed = self.cap.grab()?;
            if !grabbed || started.elapsed().as_millis() > MIN_LIVE_GRAB_MS {
                break;
            }
        }
        if !grabbed {
            log::warn!("{} stopped producing frames", self.label);
            return Ok(None);
        }

        let mut frame = Mat::default();
        if !self.cap.retrieve(&mut frame, 0)? || frame.empty() {
            log::warn!("{} delivered an undecodable frame", self.label);
            return Ok(None);
        }
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        log::info!("{} closed after {} frames", self.label, self.frames_read);
        self.cap
            .release()
            .with_context(|| format!("failed to release {}", self.label))
    }
}
