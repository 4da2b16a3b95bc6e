//! Source history persistence.
//!
//! Remembers the most recent video source in a small JSON side file so the
//! interactive prompt can offer it as a default next session. History is a
//! convenience only: a missing or malformed file yields no default, and a
//! failed save is logged but never fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const HISTORY_FILE_NAME: &str = ".source_history.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    video_source: Option<String>,
}

/// Load/save handle for the source history file.
pub struct SourceHistory {
    path: PathBuf,
}

impl SourceHistory {
    /// History stored in the current working directory, the usual case.
    pub fn in_working_dir() -> Self {
        Self::at_path(HISTORY_FILE_NAME)
    }

    pub fn at_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Previously saved source, if any usable one exists.
    pub fn load(&self) -> Option<String> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(_) => return None,
        };
        let file: HistoryFile = match serde_json::from_str(&json) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("ignoring malformed history file {}: {}", self.path.display(), e);
                return None;
            }
        };
        file.video_source.filter(|source| !source.is_empty())
    }

    /// Persist the given source for the next session. Failures are logged
    /// and swallowed so a read-only working directory cannot break the run.
    pub fn save(&self, source: &str) {
        let file = HistoryFile {
            video_source: Some(source.to_string()),
        };
        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("failed to encode source history: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            log::warn!(
                "failed to save source history to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let history = SourceHistory::at_path(dir.path().join("history.json"));
        history.save("rtsp://user:pw@192.168.0.10:554/profile1");
        assert_eq!(
            history.load().as_deref(),
            Some("rtsp://user:pw@192.168.0.10:554/profile1")
        );
    }

    #[test]
    fn missing_file_yields_no_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let history = SourceHistory::at_path(dir.path().join("nope.json"));
        assert_eq!(history.load(), None);
    }

    #[test]
    fn malformed_file_yields_no_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").expect("write");
        let history = SourceHistory::at_path(&path);
        assert_eq!(history.load(), None);
    }

    #[test]
    fn empty_saved_source_yields_no_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{"video_source": ""}"#).expect("write");
        let history = SourceHistory::at_path(&path);
        assert_eq!(history.load(), None);
    }

    #[test]
    fn save_into_missing_directory_does_not_panic() {
        let dir = tempfile::tempdir().expect("temp dir");
        let history = SourceHistory::at_path(dir.path().join("no/such/dir/history.json"));
        history.save("0");
        assert_eq!(history.load(), None);
    }
}
