//! Side-effect sink and one-shot session notices.
//!
//! The state machine fires audio/feedback cues on specific transitions.
//! Cues are fire-and-forget: a failing sink is logged by the caller and
//! never affects the phase stream. One-shot notices (duplicate intents,
//! session completion) travel on a broadcast channel decoupled from
//! phase publication, so they are observed once and never replayed.

use thiserror::Error;

// ============================================================================
// CueError
// ============================================================================

/// Errors reported by a cue sink.
#[derive(Debug, Error)]
pub enum CueError {
    /// The audio backend is unavailable (e.g., no output device).
    #[error("キューデバイスが利用できません: {0}")]
    Unavailable(String),

    /// Playback-level failure.
    #[error("キュー再生エラー: {0}")]
    Playback(String),
}

// ============================================================================
// CueSink
// ============================================================================

/// Receiver for the session's transition side effects.
///
/// Implementations must be non-blocking: each call should return
/// promptly, because the state machine dispatches cues while holding
/// its transition lock. `stopped` must be idempotent; the session may
/// release a sink that was never started or was already released.
pub trait CueSink: Send + Sync {
    /// A new session started from the beginning.
    fn session_started(&self) -> Result<(), CueError>;

    /// A new exercise interval began after a break.
    fn interval_restarted(&self) -> Result<(), CueError>;

    /// A paused exercise interval resumed.
    fn resumed(&self) -> Result<(), CueError>;

    /// An exercise interval ended or the session was paused.
    fn paused(&self) -> Result<(), CueError>;

    /// The session stopped or completed; release playback resources.
    fn stopped(&self) -> Result<(), CueError>;
}

// ============================================================================
// NullCueSink
// ============================================================================

/// A sink that ignores every cue.
///
/// Used when audio is unavailable or disabled; the session runs with
/// degraded feedback but identical timing behavior.
#[derive(Debug, Default)]
pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn session_started(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn interval_restarted(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn resumed(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn paused(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn stopped(&self) -> Result<(), CueError> {
        Ok(())
    }
}

// ============================================================================
// MockCueSink
// ============================================================================

/// A recording sink for tests.
///
/// Stores the sequence of cue calls; `calls()` returns a snapshot.
#[derive(Debug, Default)]
pub struct MockCueSink {
    calls: std::sync::Mutex<Vec<&'static str>>,
    fail: std::sync::atomic::AtomicBool,
}

impl MockCueSink {
    /// Creates a new recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent cue call fail.
    pub fn fail_all(&self) {
        self.fail.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    /// Returns the recorded cue calls in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, name: &'static str) -> Result<(), CueError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(name);
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            Err(CueError::Playback("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CueSink for MockCueSink {
    fn session_started(&self) -> Result<(), CueError> {
        self.record("session_started")
    }

    fn interval_restarted(&self) -> Result<(), CueError> {
        self.record("interval_restarted")
    }

    fn resumed(&self) -> Result<(), CueError> {
        self.record("resumed")
    }

    fn paused(&self) -> Result<(), CueError> {
        self.record("paused")
    }

    fn stopped(&self) -> Result<(), CueError> {
        self.record("stopped")
    }
}

// ============================================================================
// SessionNotice
// ============================================================================

/// One-shot events emitted on the session's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// `Start` was received while a session was already in progress.
    AlreadyInProgress,
    /// `Pause` was received with no timed interval running.
    NothingToPause,
    /// `Start` was received with an empty active exercise list.
    NoExercises,
    /// The session ran its last exercise to completion.
    SessionCompleted {
        /// Number of exercises in the completed session
        exercise_count: u32,
        /// Total elapsed seconds across all intervals
        total_seconds: u32,
    },
}

// ============================================================================
// Tests
// ============================================================================
