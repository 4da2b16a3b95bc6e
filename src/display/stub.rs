//! Scripted presenter for tests.

use std::collections::VecDeque;

use anyhow::Result;
use opencv::core::Mat;
use opencv::prelude::*;

use super::{KeyAction, Presenter};

/// Presenter that renders nowhere and replays a scripted key sequence, one
/// entry per presented frame. Once the script runs out no further keys are
/// reported.
#[derive(Default)]
pub struct StubPresenter {
    script: VecDeque<Option<KeyAction>>,
    pub frames_shown: u64,
    pub last_frame_size: Option<(i32, i32)>,
    pub closed: bool,
}

impl StubPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: impl IntoIterator<Item = Option<KeyAction>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Presenter for StubPresenter {
    fn present(&mut self, frame: &Mat, _wait_ms: i32) -> Result<Option<KeyAction>> {
        self.frames_shown += 1;
        self.last_frame_size = Some((frame.cols(), frame.rows()));
        Ok(self.script.pop_front().unwrap_or(None))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
