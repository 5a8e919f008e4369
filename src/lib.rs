//! Workout Timer Library
//!
//! This library provides the core functionality for the Workout Timer CLI.
//! It includes:
//! - The workout session state machine (phases, intents, timer loop)
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - JSON-backed stores for durations, exercises and workout history
//! - Music playback for workout sessions via rodio

pub mod cli;
pub mod daemon;
pub mod session;
pub mod sound;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{Exercise, HistoryEntry, IpcRequest, IpcResponse, Phase, ResponseData, Settings};

// Re-export session types
pub use session::{
    CueError, CueSink, ExerciseDirectory, MockCueSink, NullCueSink, SessionIntent, SessionNotice,
    WorkoutSession,
};

// Re-export store types
pub use store::{
    default_exercises, default_state_dir, ExerciseStore, HistoryStore, SettingsStore, StoreError,
    WorkoutRecord,
};

// Re-export sound types
pub use sound::{RodioCuePlayer, SoundError};
