//! Frame sources.
//!
//! This module provides the different providers a source string can resolve
//! to:
//! - Still image files (repeated as an endless stream)
//! - Local video files (seekable, finite)
//! - Webcams (device index)
//! - Network streams (RTSP or anything else the capture backend accepts)
//! - Stub source (testing)
//!
//! The source layer is responsible for:
//! - Normalizing and classifying the user's source string
//! - Opening the capture handle and failing fast when it cannot
//! - Delivering frames until the source is exhausted
//!
//! The source layer MUST NOT:
//! - Retry or reopen a source that stopped producing frames
//! - Block indefinitely once a source has been opened

use std::path::Path;

use anyhow::{bail, Context, Result};
use opencv::core::Mat;
use opencv::imgcodecs;

mod file;
mod image;
mod stream;
mod stub;

pub use file::FileSource;
pub use image::ImageSource;
pub use stream::StreamSource;
pub use stub::StubSource;

pub const STUB_SCHEME: &str = "stub://";

/// What kind of provider a source string resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    VideoFile,
    Webcam,
    Stream,
    Stub,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Image => "image",
            SourceKind::VideoFile => "video",
            SourceKind::Webcam => "webcam",
            SourceKind::Stream => "stream",
            SourceKind::Stub => "stub",
        }
    }
}

/// Sequential provider of frames.
///
/// `next_frame` returns `Ok(None)` once the source has delivered its last
/// frame. Read errors bubble up; the frame loop treats them as end of
/// stream rather than a crash.
pub trait FrameSource {
    fn kind(&self) -> SourceKind;

    /// Next frame, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;

    /// (current, total) frame position for seekable sources.
    fn position(&self) -> Option<(i64, i64)> {
        None
    }

    /// Jump forward or backward by roughly `seconds`. Returns false when
    /// the source does not support seeking.
    fn seek_by_seconds(&mut self, _seconds: f64) -> Result<bool> {
        Ok(false)
    }

    /// Release the underlying capture handle.
    fn release(&mut self) -> Result<()>;
}

/// Trim whitespace, drop one level of surrounding quotes and map webcam
/// aliases onto device index 0.
pub fn normalize_source(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = strip_matched_quotes(trimmed);
    if unquoted.eq_ignore_ascii_case("webcam") || unquoted.eq_ignore_ascii_case("cam") {
        return "0".to_string();
    }
    unquoted.to_string()
}

fn strip_matched_quotes(source: &str) -> &str {
    let bytes = source.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &source[1..source.len() - 1];
        }
    }
    source
}

/// Decide which provider should own a normalized source string.
///
/// Probe order runs from least to most intrusive: image decode first, then
/// local video files, then numeric webcam indexes. Network URLs are the
/// fallback since they cannot be validated without connecting.
pub fn classify_source(source: &str) -> SourceKind {
    if source.starts_with(STUB_SCHEME) {
        return SourceKind::Stub;
    }
    if is_readable_image(source) {
        return SourceKind::Image;
    }
    if Path::new(source).exists() {
        return SourceKind::VideoFile;
    }
    if !source.is_empty() && source.chars().all(|c| c.is_ascii_digit()) {
        return SourceKind::Webcam;
    }
    SourceKind::Stream
}

fn is_readable_image(source: &str) -> bool {
    Path::new(source).is_file() && imgcodecs::have_image_reader(source).unwrap_or(false)
}

/// Open the right provider for a raw source string.
pub fn open_source(raw: &str) -> Result<Box<dyn FrameSource>> {
    let source = normalize_source(raw);
    if source.is_empty() {
        bail!("empty video source");
    }

    let kind = classify_source(&source);
    log::info!("opening {} source: {}", kind.label(), source);
    let opened: Box<dyn FrameSource> = match kind {
        SourceKind::Stub => Box::new(StubSource::parse(&source)?),
        SourceKind::Image => Box::new(ImageSource::open(&source)?),
        SourceKind::VideoFile => Box::new(FileSource::open(&source)?),
        SourceKind::Webcam => {
            let index: i32 = source
                .parse()
                .with_context(|| format!("invalid webcam index: {}", source))?;
            Box::new(StreamSource::open_device(index)?)
        }
        SourceKind::Stream => Box::new(StreamSource::open_url(&source)?),
    };
    Ok(opened)
}
