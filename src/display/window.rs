//! OpenCV window presenter.

use anyhow::{Context, Result};
use opencv::core::Mat;
use opencv::highgui;

use super::{map_key, KeyAction, Presenter};

pub const WINDOW_TITLE: &str = "ArUco Probe - q to quit";

/// Single on-screen window backed by highgui.
pub struct DisplayWindow {
    open: bool,
}

impl DisplayWindow {
    pub fn open() -> Result<Self> {
        highgui::named_window(
            WINDOW_TITLE,
            highgui::WINDOW_GUI_NORMAL | highgui::WINDOW_AUTOSIZE,
        )
        .context("failed to create display window")?;
        Ok(Self { open: true })
    }
}

impl Presenter for DisplayWindow {
    fn present(&mut self, frame: &Mat, wait_ms: i32) -> Result<Option<KeyAction>> {
        highgui::imshow(WINDOW_TITLE, frame).context("failed to show frame")?;
        // wait_key doubles as the window's event pump, so it runs every
        // frame even when no key is expected.
        let code = highgui::wait_key(wait_ms.max(1)).context("failed to poll keyboard")?;
        Ok(map_key(code))
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            highgui::destroy_all_windows().context("failed to close display window")?;
            self.open = false;
        }
        Ok(())
    }
}
