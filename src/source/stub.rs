//! Synthetic frame source for tests.
//!
//! Accepts `stub://` specs so loop behavior can be exercised without a
//! camera or codec. Fields are comma separated:
//!
//! - `stub://frames=10` delivers ten frames, then reports end of stream
//! - `stub://endless` delivers frames until stopped externally
//! - `size=64x48` sets the frame dimensions
//! - `fail_at=5` makes the fifth read return an error (1-based)

use anyhow::{anyhow, bail, Context, Result};
use opencv::core::{Mat, Scalar, CV_8UC3};

use super::{FrameSource, SourceKind, STUB_SCHEME};

const DEFAULT_FRAMES: u64 = 30;
const DEFAULT_WIDTH: i32 = 64;
const DEFAULT_HEIGHT: i32 = 48;
/// Nominal frame rate assumed when converting seek seconds into frames.
const STUB_FPS: f64 = 10.0;

pub struct StubSource {
    width: i32,
    height: i32,
    /// `None` means the source never runs out on its own.
    total_frames: Option<u64>,
    fail_at: Option<u64>,
    seekable: bool,
    delivered: u64,
    pub released: bool,
    pub seeks: Vec<f64>,
}

impl StubSource {
    pub fn parse(spec: &str) -> Result<Self> {
        let body = spec
            .strip_prefix(STUB_SCHEME)
            .ok_or_else(|| anyhow!("not a stub source: {}", spec))?;

        let mut source = Self::finite(DEFAULT_FRAMES);
        for field in body.split(',').filter(|field| !field.is_empty()) {
            match field.split_once('=') {
                Some(("frames", value)) => {
                    let frames = value
                        .parse()
                        .with_context(|| format!("bad stub frame count: {}", value))?;
                    source.total_frames = Some(frames);
                }
                Some(("size", value)) => {
                    let (width, height) = value
                        .split_once('x')
                        .ok_or_else(|| anyhow!("bad stub size (want WxH): {}", value))?;
                    source.width = width
                        .parse()
                        .with_context(|| format!("bad stub width: {}", width))?;
                    source.height = height
                        .parse()
                        .with_context(|| format!("bad stub height: {}", height))?;
                }
                Some(("fail_at", value)) => {
                    let frame: u64 = value
                        .parse()
                        .with_context(|| format!("bad stub fail_at: {}", value))?;
                    if frame == 0 {
                        bail!("stub fail_at is 1-based, got 0");
                    }
                    source.fail_at = Some(frame);
                }
                None if field == "endless" => source.total_frames = None,
                _ => bail!("unrecognized stub field: {}", field),
            }
        }
        log::info!("stub source ready: {} (synthetic)", spec);
        Ok(source)
    }

    pub fn finite(frames: u64) -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            total_frames: Some(frames),
            fail_at: None,
            seekable: false,
            delivered: 0,
            released: false,
            seeks: Vec::new(),
        }
    }

    pub fn endless() -> Self {
        Self {
            total_frames: None,
            ..Self::finite(0)
        }
    }

    pub fn failing_at(frames: u64, fail_at: u64) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..Self::finite(frames)
        }
    }

    /// Finite source that honors seek requests at [`STUB_FPS`].
    pub fn seekable(frames: u64) -> Self {
        Self {
            seekable: true,
            ..Self::finite(frames)
        }
    }

    pub fn frames_delivered(&self) -> u64 {
        self.delivered
    }

    fn generate_frame(&self) -> Result<Mat> {
        // Shade varies with the frame counter so consumers can tell
        // frames apart.
        let shade = (self.delivered % 200) as f64 + 30.0;
        let frame =
            Mat::new_rows_cols_with_default(self.height, self.width, CV_8UC3, Scalar::all(shade))
                .context("failed to build synthetic frame")?;
        Ok(frame)
    }
}

impl FrameSource for StubSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Stub
    }

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        if let Some(fail_at) = self.fail_at {
            if self.delivered + 1 == fail_at {
                bail!("injected read failure at frame {}", fail_at);
            }
        }
        if let Some(total) = self.total_frames {
            if self.delivered >= total {
                return Ok(None);
            }
        }
        let frame = self.generate_frame()?;
        self.delivered += 1;
        Ok(Some(frame))
    }

    fn position(&self) -> Option<(i64, i64)> {
        if !self.seekable {
            return None;
        }
        let total = self.total_frames? as i64;
        Some((self.delivered as i64, total))
    }

    fn seek_by_seconds(&mut self, seconds: f64) -> Result<bool> {
        if !self.seekable {
            return Ok(false);
        }
        let total = self.total_frames.unwrap_or(u64::MAX) as i64;
        let delta = (seconds * STUB_FPS).round() as i64;
        self.delivered = (self.delivered as i64 + delta).clamp(0, total.saturating_sub(1)) as u64;
        self.seeks.push(seconds);
        Ok(true)
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}
