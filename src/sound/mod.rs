//! Music playback for workout sessions.
//!
//! This module provides the rodio-backed implementation of the
//! session's [`CueSink`](crate::session::CueSink):
//!
//! - A looping track plays while an exercise interval runs
//! - The track pauses over breaks and user pauses
//! - Stopping the session releases the audio resources (idempotent)
//! - Graceful degradation when audio is unavailable: the daemon falls
//!   back to a silent sink and the session runs with degraded feedback

mod error;
mod player;

pub use error::SoundError;
pub use player::RodioCuePlayer;
