//! Duration configuration store.
//!
//! Owns the current [`Settings`] value, persists changes to
//! `config.json` and pushes every accepted change over a watch channel.
//! The session samples the channel at interval entry only, so a change
//! made while an interval is counting down applies to the next interval.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::debug;

use crate::types::Settings;

use super::{default_state_dir, read_json, write_json, StoreError};

/// Name of the configuration file inside the state directory.
pub const CONFIG_FILE: &str = "config.json";

/// JSON-backed duration configuration store.
#[derive(Debug)]
pub struct SettingsStore {
    /// Backing file path
    path: PathBuf,
    /// Current value plus push channel
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    /// Loads the store from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let settings = read_json(&path).unwrap_or_else(|| {
            debug!("using default duration configuration");
            Settings::default()
        });
        let (tx, _) = watch::channel(settings);
        Self { path, tx }
    }

    /// Opens the store at its default location (`~/.workout/config.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::load(default_state_dir()?.join(CONFIG_FILE)))
    }

    /// Returns the current configuration.
    pub fn current(&self) -> Settings {
        *self.tx.borrow()
    }

    /// Subscribes to configuration changes (current value replayed).
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Applies an update, validates it, persists it and pushes it to
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated value fails validation or cannot
    /// be written; the in-memory value is left unchanged in both cases.
    pub fn save(&self, update: impl FnOnce(Settings) -> Settings) -> Result<Settings, StoreError> {
        let updated = update(self.current());
        updated.validate().map_err(StoreError::Invalid)?;
        write_json(&self.path, &updated)?;
        self.tx.send_replace(updated);
        Ok(updated)
    }
}

// ============================================================================
// Tests
// ============================================================================
