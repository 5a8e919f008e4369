//! Workout history store.
//!
//! Append-only records of completed sessions. The daemon writes one
//! record per `SessionCompleted` notice; nothing here feeds back into
//! the state machine.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::HistoryEntry;

use super::{default_state_dir, read_json, write_json, StoreError};

/// Name of the history file inside the state directory.
pub const HISTORY_FILE: &str = "history.json";

/// A completed workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Record identifier
    pub id: Uuid,
    /// Completion time
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
    /// Total session duration in seconds (exercises plus breaks)
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    /// Number of exercises completed
    #[serde(rename = "exerciseCount")]
    pub exercise_count: u32,
}

impl WorkoutRecord {
    /// Creates a record stamped with the current time.
    pub fn new(duration_seconds: u32, exercise_count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            duration_seconds,
            exercise_count,
        }
    }

    /// Converts the record into its wire representation.
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id.to_string(),
            completed_at: self.completed_at.to_rfc3339(),
            duration_seconds: self.duration_seconds,
            exercise_count: self.exercise_count,
        }
    }
}

/// JSON-backed workout history store.
#[derive(Debug)]
pub struct HistoryStore {
    /// Backing file path
    path: PathBuf,
    /// Records in completion order
    records: Mutex<Vec<WorkoutRecord>>,
}

impl HistoryStore {
    /// Loads the store from `path`; a missing or unreadable file yields
    /// an empty history.
    pub fn load(path: PathBuf) -> Self {
        let records: Vec<WorkoutRecord> = read_json(&path).unwrap_or_default();
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Opens the store at its default location
    /// (`~/.workout/history.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::load(default_state_dir()?.join(HISTORY_FILE)))
    }

    /// Returns all records in completion order.
    pub fn all(&self) -> Vec<WorkoutRecord> {
        self.lock_records().clone()
    }

    /// Appends a record and persists the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written; memory is left
    /// unchanged in that case.
    pub fn append(&self, record: WorkoutRecord) -> Result<(), StoreError> {
        let mut records = self.lock_records();
        let mut updated = records.clone();
        updated.push(record);
        write_json(&self.path, &updated)?;
        *records = updated;
        Ok(())
    }

    /// Removes all records and persists the empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.lock_records();
        write_json(&self.path, &Vec::<WorkoutRecord>::new())?;
        records.clear();
        Ok(())
    }

    fn lock_records(&self) -> MutexGuard<'_, Vec<WorkoutRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests
// ============================================================================
