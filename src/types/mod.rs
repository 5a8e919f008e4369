//! Core data types for the Workout Timer.
//!
//! This module defines the data structures used for:
//! - Exercise definitions and the duration configuration
//! - The workout phase (the state machine's published value)
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

// ============================================================================
// Exercise
// ============================================================================

/// A single exercise in the workout list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique exercise identifier
    pub id: u32,
    /// Display name
    pub name: String,
    /// Whether this exercise is part of the active workout
    pub included: bool,
    /// Default duration in seconds
    #[serde(rename = "durationSeconds", default = "default_exercise_duration")]
    pub duration_seconds: u32,
}

/// Default per-exercise duration in seconds (one minute).
fn default_exercise_duration() -> u32 {
    60
}

impl Exercise {
    /// Creates a new exercise with the default duration.
    pub fn new(id: u32, name: impl Into<String>, included: bool) -> Self {
        Self {
            id,
            name: name.into(),
            included,
            duration_seconds: default_exercise_duration(),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Duration configuration for workout sessions.
///
/// These values are sampled by the state machine at interval entry only;
/// changing them never resizes an interval that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Exercise interval duration in seconds (5-3600)
    #[serde(rename = "exerciseSeconds")]
    pub exercise_seconds: u32,
    /// Break interval duration in seconds (5-1800)
    #[serde(rename = "breakSeconds")]
    pub break_seconds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exercise_seconds: 60,
            break_seconds: 30,
        }
    }
}

impl Settings {
    /// Creates a new configuration with the specified exercise duration.
    pub fn with_exercise_seconds(mut self, seconds: u32) -> Self {
        self.exercise_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified break duration.
    pub fn with_break_seconds(mut self, seconds: u32) -> Self {
        self.break_seconds = seconds;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.exercise_seconds < 5 || self.exercise_seconds > 3600 {
            return Err("エクササイズ時間は5-3600秒の範囲で指定してください".to_string());
        }
        if self.break_seconds < 5 || self.break_seconds > 1800 {
            return Err("休憩時間は5-1800秒の範囲で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Phase
// ============================================================================

/// The current phase of the workout session.
///
/// Exactly one value is live at a time; the state machine replaces it
/// atomically on every transition. Timed variants carry the snapshot of
/// the exercise list captured at session start, and paused variants carry
/// the interval total captured when the interval began, so resuming reuses
/// the original total instead of re-reading the configuration mid-interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No session is running.
    NotStarted {
        /// The currently active exercise list (what a new session would run)
        exercises: Vec<Exercise>,
    },
    /// An exercise interval is counting down.
    InProgress {
        /// Remaining seconds in this interval
        seconds_left: u32,
        /// Total seconds of this interval (fixed for its lifetime)
        seconds_total: u32,
        /// Index of the exercise being performed
        exercise_index: usize,
        /// Exercise list snapshot captured at session start
        exercises: Vec<Exercise>,
    },
    /// A break interval is counting down.
    Break {
        /// Remaining seconds in this break
        seconds_left: u32,
        /// Total seconds of this break (fixed for its lifetime)
        seconds_total: u32,
        /// Index of the exercise that follows this break
        next_exercise_index: usize,
        /// Exercise list snapshot captured at session start
        exercises: Vec<Exercise>,
    },
    /// An exercise interval is paused.
    PausedTraining {
        /// Remaining seconds at the moment of pause
        seconds_left: u32,
        /// Total seconds of the paused interval
        seconds_total: u32,
        /// Index of the paused exercise
        exercise_index: usize,
        /// Exercise list snapshot captured at session start
        exercises: Vec<Exercise>,
    },
    /// A break interval is paused.
    PausedBreak {
        /// Remaining seconds at the moment of pause
        seconds_left: u32,
        /// Total seconds of the paused break
        seconds_total: u32,
        /// Index of the exercise that follows the break
        next_exercise_index: usize,
        /// Exercise list snapshot captured at session start
        exercises: Vec<Exercise>,
    },
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::NotStarted { .. } => "not_started",
            Phase::InProgress { .. } => "in_progress",
            Phase::Break { .. } => "break",
            Phase::PausedTraining { .. } => "paused_training",
            Phase::PausedBreak { .. } => "paused_break",
        }
    }

    /// Returns true if a timer loop should be running for this phase.
    pub fn is_timed(&self) -> bool {
        matches!(self, Phase::InProgress { .. } | Phase::Break { .. })
    }

    /// Returns true if the session is paused.
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            Phase::PausedTraining { .. } | Phase::PausedBreak { .. }
        )
    }

    /// Returns the remaining seconds, if this phase carries a countdown.
    pub fn seconds_left(&self) -> Option<u32> {
        match self {
            Phase::NotStarted { .. } => None,
            Phase::InProgress { seconds_left, .. }
            | Phase::Break { seconds_left, .. }
            | Phase::PausedTraining { seconds_left, .. }
            | Phase::PausedBreak { seconds_left, .. } => Some(*seconds_left),
        }
    }

    /// Returns the interval total, if this phase carries one.
    pub fn seconds_total(&self) -> Option<u32> {
        match self {
            Phase::NotStarted { .. } => None,
            Phase::InProgress { seconds_total, .. }
            | Phase::Break { seconds_total, .. }
            | Phase::PausedTraining { seconds_total, .. }
            | Phase::PausedBreak { seconds_total, .. } => Some(*seconds_total),
        }
    }

    /// Returns the exercise list snapshot carried by this phase.
    pub fn exercises(&self) -> &[Exercise] {
        match self {
            Phase::NotStarted { exercises }
            | Phase::InProgress { exercises, .. }
            | Phase::Break { exercises, .. }
            | Phase::PausedTraining { exercises, .. }
            | Phase::PausedBreak { exercises, .. } => exercises,
        }
    }

    /// Returns the index of the current or upcoming exercise, if any.
    pub fn exercise_index(&self) -> Option<usize> {
        match self {
            Phase::NotStarted { .. } => None,
            Phase::InProgress { exercise_index, .. }
            | Phase::PausedTraining { exercise_index, .. } => Some(*exercise_index),
            Phase::Break {
                next_exercise_index,
                ..
            }
            | Phase::PausedBreak {
                next_exercise_index,
                ..
            } => Some(*next_exercise_index),
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::NotStarted { exercises: vec![] }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start or resume the workout session
    Start,
    /// Pause the current session
    Pause,
    /// Stop the current session
    Stop,
    /// Query the current status
    Status,
    /// List all exercises
    Exercises,
    /// Update an exercise's inclusion flag
    Include {
        /// Exercise identifier
        id: u32,
        /// New inclusion flag
        included: bool,
    },
    /// Read or update the duration configuration
    Durations {
        /// New exercise duration in seconds, if changing
        #[serde(rename = "exerciseSeconds", skip_serializing_if = "Option::is_none")]
        exercise_seconds: Option<u32>,
        /// New break duration in seconds, if changing
        #[serde(rename = "breakSeconds", skip_serializing_if = "Option::is_none")]
        break_seconds: Option<u32>,
    },
    /// List recorded workout history
    History,
    /// Clear recorded workout history
    HistoryClear,
}

/// A workout history entry as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Record identifier
    pub id: String,
    /// Completion time (RFC 3339)
    #[serde(rename = "completedAt")]
    pub completed_at: String,
    /// Total session duration in seconds
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    /// Number of exercises completed
    #[serde(rename = "exerciseCount")]
    pub exercise_count: u32,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining seconds in the current interval
    #[serde(rename = "secondsLeft", skip_serializing_if = "Option::is_none")]
    pub seconds_left: Option<u32>,
    /// Total seconds of the current interval
    #[serde(rename = "secondsTotal", skip_serializing_if = "Option::is_none")]
    pub seconds_total: Option<u32>,
    /// Index of the current or upcoming exercise
    #[serde(rename = "exerciseIndex", skip_serializing_if = "Option::is_none")]
    pub exercise_index: Option<usize>,
    /// Name of the current or upcoming exercise
    #[serde(rename = "exerciseName", skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    /// Number of exercises in the session snapshot
    #[serde(rename = "exerciseCount", skip_serializing_if = "Option::is_none")]
    pub exercise_count: Option<usize>,
    /// Current duration configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// Full exercise list (for the exercises command)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
    /// Workout history (for the history command)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

impl ResponseData {
    /// Creates response data from a phase snapshot.
    pub fn from_phase(phase: &Phase) -> Self {
        let exercise_name = phase
            .exercise_index()
            .and_then(|i| phase.exercises().get(i))
            .map(|e| e.name.clone());
        Self {
            state: Some(phase.as_str().to_string()),
            seconds_left: phase.seconds_left(),
            seconds_total: phase.seconds_total(),
            exercise_index: phase.exercise_index(),
            exercise_name,
            exercise_count: Some(phase.exercises().len()),
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
