//! Runtime detection configuration.
//!
//! Holds the three knobs the keyboard controls mutate while the frame loop
//! runs: marker dictionary size, maximum marker ID and display size. The
//! detector reads the active dictionary selection once per frame; the
//! display size only affects rendering.

use crate::detect::DictKey;

pub const MIN_DISPLAY_PX: i32 = 100;
pub const MAX_DISPLAY_PX: i32 = 4000;
pub const DISPLAY_STEP_PX: i32 = 50;
pub const DEFAULT_DISPLAY_PX: i32 = 1000;

/// Marker grid size of the active ArUco dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DictSize {
    Bits4x4,
    Bits5x5,
    Bits6x6,
    Bits7x7,
}

impl DictSize {
    /// Next size in the cycle order, wrapping from 7x7 back to 4x4.
    pub fn cycled(self) -> Self {
        match self {
            DictSize::Bits4x4 => DictSize::Bits5x5,
            DictSize::Bits5x5 => DictSize::Bits6x6,
            DictSize::Bits6x6 => DictSize::Bits7x7,
            DictSize::Bits7x7 => DictSize::Bits4x4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DictSize::Bits4x4 => "4x4",
            DictSize::Bits5x5 => "5x5",
            DictSize::Bits6x6 => "6x6",
            DictSize::Bits7x7 => "7x7",
        }
    }
}

/// Number of distinct marker IDs in the active ArUco dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxId {
    Ids50,
    Ids100,
    Ids250,
    Ids1000,
}

impl MaxId {
    /// Next count in the cycle order, wrapping from 1000 back to 50.
    pub fn cycled(self) -> Self {
        match self {
            MaxId::Ids50 => MaxId::Ids100,
            MaxId::Ids100 => MaxId::Ids250,
            MaxId::Ids250 => MaxId::Ids1000,
            MaxId::Ids1000 => MaxId::Ids50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaxId::Ids50 => "50",
            MaxId::Ids100 => "100",
            MaxId::Ids250 => "250",
            MaxId::Ids1000 => "1000",
        }
    }
}

/// Mutable per-session detection settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionConfig {
    pub dict_size: DictSize,
    pub max_id: MaxId,
    /// Target side length (px) for the longest edge of the displayed frame.
    pub display_px: i32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            dict_size: DictSize::Bits4x4,
            max_id: MaxId::Ids1000,
            display_px: DEFAULT_DISPLAY_PX,
        }
    }
}

impl DetectionConfig {
    pub fn with_display_px(display_px: i32) -> Self {
        Self {
            display_px: display_px.clamp(MIN_DISPLAY_PX, MAX_DISPLAY_PX),
            ..Self::default()
        }
    }

    /// Grow the display size by one step, saturating at the upper bound.
    pub fn grow_display(&mut self) {
        self.display_px = (self.display_px + DISPLAY_STEP_PX).min(MAX_DISPLAY_PX);
    }

    /// Shrink the display size by one step, saturating at the lower bound.
    pub fn shrink_display(&mut self) {
        self.display_px = (self.display_px - DISPLAY_STEP_PX).max(MIN_DISPLAY_PX);
    }

    pub fn cycle_dict_size(&mut self) {
        self.dict_size = self.dict_size.cycled();
    }

    pub fn cycle_max_id(&mut self) {
        self.max_id = self.max_id.cycled();
    }

    /// Dictionary selection consumed by the detector backend.
    pub fn dict_key(&self) -> DictKey {
        DictKey {
            size: self.dict_size,
            max_id: self.max_id,
        }
    }

    /// Scale factor mapping a native frame onto the display size.
    pub fn scale_factor(&self, frame_w: i32, frame_h: i32) -> f64 {
        let longest = frame_w.max(frame_h).max(1);
        f64::from(self.display_px) / f64::from(longest)
    }

    /// Short form shown in the status bar, e.g. "4x4:1000".
    pub fn dict_label(&self) -> String {
        format!("{}:{}", self.dict_size.label(), self.max_id.label())
    }
}
