//! JSON-backed state stores for the Workout Timer.
//!
//! Everything lives under a single state directory (`~/.workout/` by
//! default):
//! - `config.json`: duration configuration ([`SettingsStore`])
//! - `exercises.json`: the exercise list ([`ExerciseStore`])
//! - `history.json`: completed workout records ([`HistoryStore`])
//!
//! Stores follow a last-known-good policy: a missing or unreadable file
//! falls back to defaults and is logged, never surfaced to the session.

mod error;
mod exercises;
mod history;
mod settings;

pub use error::StoreError;
pub use exercises::{default_exercises, ExerciseStore, EXERCISES_FILE};
pub use history::{HistoryStore, WorkoutRecord, HISTORY_FILE};
pub use settings::{SettingsStore, CONFIG_FILE};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Name of the state directory under the home directory.
pub const STATE_DIR_NAME: &str = ".workout";

/// Returns the default state directory (`~/.workout`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_state_dir() -> Result<PathBuf, StoreError> {
    dirs::home_dir()
        .map(|home| home.join(STATE_DIR_NAME))
        .ok_or(StoreError::NoHomeDir)
}

/// Reads a JSON value from `path`.
///
/// Returns `None` when the file is missing or unreadable; unreadable
/// files are logged so callers can fall back to defaults silently.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("state file {:?} not found, using defaults", path);
            return None;
        }
        Err(e) => {
            warn!("failed to read state file {:?}: {}", path, e);
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("failed to parse state file {:?}: {}", path, e);
            None
        }
    }
}

/// Writes a JSON value to `path`, creating parent directories as needed.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
