//! Workspace tuning knobs.
//!
//! # Invariants
//! - Every field has a default, so partial JSON documents deserialize.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 50;
/// Twelve and a half 16px text units.
const DEFAULT_BASE_NOTE_SIZE: f64 = 200.0;
const DEFAULT_DATABASE_FILE: &str = "notespace.sqlite3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Quiet period after the last mutation before state is written.
    pub save_debounce_ms: u64,
    /// Note edge length in pixels at zoom 100.
    pub base_note_size: f64,
    /// File name of the SQLite blob store.
    pub database_file: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            base_note_size: DEFAULT_BASE_NOTE_SIZE,
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

impl WorkspaceConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Parses a JSON config document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
