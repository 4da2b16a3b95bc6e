//! Still-image source.
//!
//! Decodes the file once and repeats it as an endless frame stream so
//! detection can be tuned against a static scene. A loop over an image
//! ends only on a quit key or interrupt.

use anyhow::{bail, Context, Result};
use opencv::core::Mat;
use opencv::imgcodecs;
use opencv::prelude::*;

use super::{FrameSource, SourceKind};

pub struct ImageSource {
    image: Mat,
}

impl ImageSource {
    pub fn open(path: &str) -> Result<Self> {
        let image = imgcodecs::imread(path, imgcodecs::IMREAD_COLOR)
            .with_context(|| format!("failed to read image file {}", path))?;
        if image.empty() {
            bail!("failed to decode image file {}", path);
        }
        log::info!(
            "image source ready: {} ({}x{})",
            path,
            image.cols(),
            image.rows()
        );
        Ok(Self { image })
    }
}

impl FrameSource for ImageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Image
    }

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        // Fresh copy per iteration so overlays never accumulate on the
        // decoded original.
        let copy = self.image.try_clone().context("failed to copy image frame")?;
        Ok(Some(copy))
    }

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}
