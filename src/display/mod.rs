//! Display output and keyboard input.
//!
//! This module owns the on-screen side of the frame loop:
//! - Presenting rendered frames in a window
//! - Polling the keyboard with a bounded wait
//! - Mapping raw key codes onto loop actions
//!
//! The display layer MUST NOT:
//! - Mutate detection settings itself (the frame loop applies actions)
//! - Block longer than the wait passed by the caller

use anyhow::Result;
use opencv::core::Mat;

use crate::config::DetectionConfig;

mod stub;
mod window;

pub use stub::StubPresenter;
pub use window::DisplayWindow;

const KEY_QUIT: i32 = 113;
const KEY_ESCAPE: i32 = 27;
const KEY_UP_ARROW: i32 = 82;
const KEY_DOWN_ARROW: i32 = 84;
const KEY_LEFT_ARROW: i32 = 81;
const KEY_RIGHT_ARROW: i32 = 83;
const KEY_DICT_SIZE: i32 = 100;
const KEY_MAX_IDS: i32 = 109;

/// Action requested through the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    GrowDisplay,
    ShrinkDisplay,
    CycleDictSize,
    CycleMaxIds,
    SeekBack,
    SeekForward,
}

/// Map a raw `wait_key` code onto an action.
///
/// Codes below zero mean no key arrived during the wait. The code is masked
/// to a byte first since some platforms set high bits on special keys.
pub fn map_key(code: i32) -> Option<KeyAction> {
    if code < 0 {
        return None;
    }
    match code & 0xff {
        KEY_QUIT | KEY_ESCAPE => Some(KeyAction::Quit),
        KEY_UP_ARROW => Some(KeyAction::GrowDisplay),
        KEY_DOWN_ARROW => Some(KeyAction::ShrinkDisplay),
        KEY_DICT_SIZE => Some(KeyAction::CycleDictSize),
        KEY_MAX_IDS => Some(KeyAction::CycleMaxIds),
        KEY_LEFT_ARROW => Some(KeyAction::SeekBack),
        KEY_RIGHT_ARROW => Some(KeyAction::SeekForward),
        _ => None,
    }
}

/// Sink for rendered frames.
pub trait Presenter {
    /// Show one frame, wait up to `wait_ms` for a key and report the action
    /// it maps to.
    fn present(&mut self, frame: &Mat, wait_ms: i32) -> Result<Option<KeyAction>>;

    /// Tear down the output. Safe to call on every exit path.
    fn close(&mut self) -> Result<()>;
}

/// One-line summary shown in the status bar.
pub fn format_status(
    config: &DetectionConfig,
    hits: usize,
    position: Option<(i64, i64)>,
) -> String {
    let mut line = format!(
        "{} | display {}px | markers {}",
        config.dict_label(),
        config.display_px,
        hits
    );
    if let Some((current, total)) = position {
        line.push_str(&format!(" | frame {}/{}", current, total));
    }
    line
}
