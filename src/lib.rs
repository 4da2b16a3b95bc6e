//! ArUco Probe
//!
//! This crate implements a visual test bench for ArUco marker detection.
//! It opens a video source, runs marker detection on every frame and shows
//! the detections in a window, with keyboard controls for the marker
//! dictionary and the display size.
//!
//! # Module Structure
//!
//! - `source`: Frame sources (video files, images, webcams, network streams)
//! - `detect`: Marker detection backends and the detector configuration key
//! - `overlay`: Detection overlay drawing and display scaling
//! - `display`: Window output and keyboard input mapping
//! - `runner`: The frame loop tying sources, detection and display together
//! - `config`: Detection settings mutated by the keyboard controls
//! - `history`: Remembering the last source between runs

pub mod config;
pub mod detect;
pub mod display;
pub mod history;
pub mod overlay;
pub mod runner;
pub mod source;

pub use config::{DetectionConfig, DictSize, MaxId};
pub use detect::{ArucoBackend, DictKey, MarkerDetector, MarkerHit};
pub use display::{KeyAction, Presenter};
pub use runner::{run_loop, LoopOutcome, StopReason};
pub use source::{open_source, FrameSource, SourceKind};
