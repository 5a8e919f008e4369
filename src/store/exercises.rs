//! Exercise list store.
//!
//! Owns the ordered exercise list, persists it to `exercises.json` and
//! pushes the *active* (included) subset over a watch channel. The
//! session samples the channel at session start; inclusion updates made
//! mid-session only affect the next session.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::session::ExerciseDirectory;
use crate::types::Exercise;

use super::{default_state_dir, read_json, write_json, StoreError};

/// Name of the exercise list file inside the state directory.
pub const EXERCISES_FILE: &str = "exercises.json";

/// Returns the exercise list seeded on first run.
pub fn default_exercises() -> Vec<Exercise> {
    vec![
        Exercise::new(1, "Jumping jacks", true),
        Exercise::new(2, "Crunches", true),
        Exercise::new(3, "Squats", true),
        Exercise::new(4, "Push-ups", true),
        Exercise::new(5, "V-ups", true),
        Exercise::new(6, "Plank", true),
        Exercise::new(7, "Arm circles", false),
        Exercise::new(8, "Pull-ups", true),
        Exercise::new(9, "Back extensions", true),
        Exercise::new(10, "Mountain climbers", true),
        Exercise::new(11, "Superman hold", true),
        Exercise::new(12, "Human flag", false),
    ]
}

/// JSON-backed exercise list store.
#[derive(Debug)]
pub struct ExerciseStore {
    /// Backing file path
    path: PathBuf,
    /// Full ordered list, including excluded exercises
    all: Mutex<Vec<Exercise>>,
    /// Active subset plus push channel
    active_tx: watch::Sender<Vec<Exercise>>,
}

impl ExerciseStore {
    /// Loads the store from `path`, seeding the default list when the
    /// file is missing, unreadable or empty.
    pub fn load(path: PathBuf) -> Self {
        let all: Vec<Exercise> = read_json(&path).unwrap_or_default();
        let all = if all.is_empty() {
            let seeded = default_exercises();
            info!("seeding default exercise list ({} exercises)", seeded.len());
            if let Err(e) = write_json(&path, &seeded) {
                warn!("failed to persist seeded exercise list: {}", e);
            }
            seeded
        } else {
            all
        };
        let active: Vec<Exercise> = all.iter().filter(|e| e.included).cloned().collect();
        let (active_tx, _) = watch::channel(active);
        Self {
            path,
            all: Mutex::new(all),
            active_tx,
        }
    }

    /// Opens the store at its default location
    /// (`~/.workout/exercises.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::load(default_state_dir()?.join(EXERCISES_FILE)))
    }

    /// Returns the full ordered exercise list.
    pub fn all(&self) -> Vec<Exercise> {
        self.lock_all().clone()
    }

    /// Returns the active (included) subset.
    pub fn active(&self) -> Vec<Exercise> {
        self.active_tx.borrow().clone()
    }

    /// Subscribes to changes of the active subset (current value
    /// replayed).
    pub fn subscribe_active(&self) -> watch::Receiver<Vec<Exercise>> {
        self.active_tx.subscribe()
    }

    /// Persists a new inclusion flag for the given exercise.
    ///
    /// Returns `Ok(false)` if no exercise has the given id. Setting the
    /// flag to its current value is a no-op (no disk write, no push).
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be written; memory
    /// is left unchanged in that case.
    pub fn set_included(&self, id: u32, included: bool) -> Result<bool, StoreError> {
        let mut all = self.lock_all();
        let Some(position) = all.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        if all[position].included == included {
            return Ok(true);
        }

        let mut updated = all.clone();
        updated[position].included = included;
        write_json(&self.path, &updated)?;

        *all = updated;
        let active: Vec<Exercise> = all.iter().filter(|e| e.included).cloned().collect();
        self.active_tx.send_replace(active);
        Ok(true)
    }

    fn lock_all(&self) -> MutexGuard<'_, Vec<Exercise>> {
        self.all.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExerciseDirectory for ExerciseStore {
    fn set_included(&self, id: u32, included: bool) -> anyhow::Result<bool> {
        Ok(ExerciseStore::set_included(self, id, included)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
