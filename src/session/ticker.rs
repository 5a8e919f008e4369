//! The session's timer loop.
//!
//! A single tokio task ticks once per second and feeds each tick back
//! into the state machine. At most one loop is live per session; the
//! machine enforces this by owning at most one [`TickerGuard`] at a
//! time. Cancellation is generation-guarded: every spawned loop carries
//! a generation number, and the machine discards ticks whose generation
//! no longer matches the live guard, so a tick racing with `stop` can
//! never mutate state after the stop took effect.

use std::sync::Weak;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::trace;

use super::machine::WorkoutSession;

/// Handle to a running timer loop.
///
/// Dropping the guard aborts the loop task. The task itself holds only
/// a weak reference to the session, so a dropped session tears the loop
/// down on its next tick even if the guard leaked.
#[derive(Debug)]
pub(crate) struct TickerGuard {
    generation: u64,
    handle: JoinHandle<()>,
}

impl TickerGuard {
    /// Spawns a 1 Hz timer loop feeding ticks into the session.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(session: Weak<WorkoutSession>, generation: u64) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately;
            // consume it so the countdown starts one second from now.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(session) = session.upgrade() else {
                    trace!("session dropped, ticker exiting");
                    break;
                };
                session.on_tick(generation);
            }
        });

        Self { generation, handle }
    }

    /// Returns the generation this loop was spawned with.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
