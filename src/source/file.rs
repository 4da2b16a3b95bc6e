//! Video file source.
//!
//! Plain sequential reads over a local file. A failed read means the last
//! frame was consumed. Files are the only seekable sources and back the
//! arrow-key seek bindings.

use anyhow::{bail, Context, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::{FrameSource, SourceKind};

const FALLBACK_FPS: f64 = 30.0;

pub struct FileSource {
    cap: VideoCapture,
    path: String,
    fps: f64,
    total_frames: i64,
}

impl FileSource {
    pub fn open(path: &str) -> Result<Self> {
        let cap = VideoCapture::from_file(path, videoio::CAP_ANY)
            .with_context(|| format!("failed to open video file {}", path))?;
        if !cap.is_opened()? {
            bail!("unable to open video file {}", path);
        }

        let fps = cap.get(videoio::CAP_PROP_FPS)?;
        let total_frames = cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i64;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i64;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i64;
        log::info!(
            "video file ready: {} ({}x{}, {:.1} fps, {} frames)",
            path,
            width,
            height,
            fps,
            total_frames
        );

        Ok(Self {
            cap,
            path: path.to_string(),
            fps,
            total_frames,
        })
    }
}

impl FrameSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::VideoFile
    }

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = self
            .cap
            .read(&mut frame)
            .with_context(|| format!("read failed on {}", self.path))?;
        if !ok || frame.empty() {
            log::info!("reached end of {}", self.path);
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn position(&self) -> Option<(i64, i64)> {
        if self.total_frames <= 0 {
            return None;
        }
        let current = self.cap.get(videoio::CAP_PROP_POS_FRAMES).ok()? as i64;
        Some((current, self.total_frames))
    }

    fn seek_by_seconds(&mut self, seconds: f64) -> Result<bool> {
        if self.total_frames <= 0 {
            return Ok(false);
        }
        let current = self.cap.get(videoio::CAP_PROP_POS_FRAMES)? as i64;
        let target = seek_target(current, seconds, self.fps, self.total_frames);
        self.cap.set(videoio::CAP_PROP_POS_FRAMES, target as f64)?;
        log::debug!(
            "seek {} to frame {}/{}",
            self.path,
            target,
            self.total_frames
        );
        Ok(true)
    }

    fn release(&mut self) -> Result<()> {
        self.cap
            .release()
            .with_context(|| format!("failed to release {}", self.path))
    }
}

/// Frame index after seeking `seconds` from `current`, clamped to the
/// file's frame range. Containers without an fps hint fall back to
/// [`FALLBACK_FPS`].
fn seek_target(current: i64, seconds: f64, fps: f64, total_frames: i64) -> i64 {
    let fps = if fps > 0.0 { fps } else { FALLBACK_FPS };
    let delta = (seconds * fps).round() as i64;
    (current + delta).clamp(0, total_frames - 1)
}
