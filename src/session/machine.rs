//! The workout session state machine.
//!
//! This is the single source of truth for the current [`Phase`]. All
//! transitions — user intents and timer ticks alike — serialize through
//! one transition lock, which also guards timer-loop start/stop. The
//! phase value itself lives in a `watch` channel: subscribers always see
//! the latest phase on subscribe and every published update after that,
//! including same-phase countdown decrements.
//!
//! Duration and exercise-list snapshots are sampled when an interval
//! begins, never mid-interval: a configuration change while an interval
//! is counting down applies to the next interval only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::types::{Exercise, Phase, Settings};

use super::cue::{CueError, CueSink, SessionNotice};
use super::ticker::TickerGuard;

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the one-shot notice channel.
const NOTICE_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// SessionIntent
// ============================================================================

/// External commands accepted by the session.
///
/// Intent handling is fire-and-forget: an intent that is invalid in the
/// current phase is ignored at the phase level and at most produces a
/// [`SessionNotice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIntent {
    /// Start a new session, or resume a paused one.
    Start,
    /// Pause the running interval.
    Pause,
    /// Stop the session and reset to not-started.
    Stop,
    /// Persist a new inclusion flag for an exercise.
    ///
    /// Applies to the next session; the snapshot carried by a live
    /// session is deliberately left untouched.
    SetExerciseIncluded {
        /// Exercise identifier
        id: u32,
        /// New inclusion flag
        included: bool,
    },
}

// ============================================================================
// ExerciseDirectory
// ============================================================================

/// External owner of the persisted exercise list.
///
/// The session only writes inclusion flags through this trait; reading
/// the active list happens through the watch channel passed at
/// construction.
pub trait ExerciseDirectory: Send + Sync {
    /// Persists a new inclusion flag.
    ///
    /// Returns `Ok(false)` if no exercise has the given id.
    fn set_included(&self, id: u32, included: bool) -> anyhow::Result<bool>;
}

// ============================================================================
// WorkoutSession
// ============================================================================

/// The workout timing state machine.
///
/// One instance exists per running daemon. Intents may arrive from any
/// number of concurrent callers; they are applied in lock-acquisition
/// order and every observer sees a single total order of phases.
pub struct WorkoutSession {
    /// Transition lock: phase inspection, phase publication and timer
    /// loop start/stop all happen under this mutex. It is never held
    /// across an await point.
    inner: Mutex<SessionInner>,
    /// Phase storage and publication channel.
    phase_tx: watch::Sender<Phase>,
    /// One-shot notice channel.
    notice_tx: broadcast::Sender<SessionNotice>,
    /// Latest duration configuration, sampled at interval entry.
    settings_rx: watch::Receiver<Settings>,
    /// Latest active exercise list, sampled at session start.
    exercises_rx: watch::Receiver<Vec<Exercise>>,
    /// Persistence for exercise inclusion updates.
    directory: Arc<dyn ExerciseDirectory>,
    /// Transition side-effect sink.
    cues: Arc<dyn CueSink>,
}

/// State owned by the transition lock.
struct SessionInner {
    /// The running timer loop, if any.
    ticker: Option<TickerGuard>,
    /// Generation counter for loop spawns.
    next_generation: u64,
    /// Seconds elapsed in the current session (for history records).
    elapsed_seconds: u32,
}

impl WorkoutSession {
    /// Creates a new session in the not-started phase.
    ///
    /// The initial phase carries a snapshot of the currently active
    /// exercise list so observers can render the upcoming workout.
    pub fn new(
        settings_rx: watch::Receiver<Settings>,
        exercises_rx: watch::Receiver<Vec<Exercise>>,
        directory: Arc<dyn ExerciseDirectory>,
        cues: Arc<dyn CueSink>,
    ) -> Arc<Self> {
        let initial = Phase::NotStarted {
            exercises: exercises_rx.borrow().clone(),
        };
        let (phase_tx, _) = watch::channel(initial);
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        Arc::new(Self {
            inner: Mutex::new(SessionInner {
                ticker: None,
                next_generation: 0,
                elapsed_seconds: 0,
            }),
            phase_tx,
            notice_tx,
            settings_rx,
            exercises_rx,
            directory,
            cues,
        })
    }

    /// Returns a snapshot of the current phase.
    pub fn current_phase(&self) -> Phase {
        self.phase_tx.borrow().clone()
    }

    /// Subscribes to phase updates (current phase replayed on subscribe).
    pub fn observe_phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    /// Subscribes to one-shot session notices (no replay).
    pub fn observe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    /// Applies an external intent.
    ///
    /// Fire-and-forget: invalid intents are no-ops at the phase level.
    pub fn handle(self: &Arc<Self>, intent: SessionIntent) {
        match intent {
            SessionIntent::Start => self.start(),
            SessionIntent::Pause => self.pause(),
            SessionIntent::Stop => self.stop(),
            SessionIntent::SetExerciseIncluded { id, included } => {
                self.set_exercise_included(id, included);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Intent transitions
    // ------------------------------------------------------------------------

    /// Starts a new session or resumes a paused one.
    fn start(self: &Arc<Self>) {
        let mut inner = self.lock_inner();
        match self.current_phase() {
            Phase::InProgress { .. } | Phase::Break { .. } => {
                drop(inner);
                self.notify(SessionNotice::AlreadyInProgress);
            }
            Phase::PausedTraining {
                seconds_left,
                seconds_total,
                exercise_index,
                exercises,
            } => {
                // Resume with the total captured when the interval began;
                // a configuration change while paused applies to the next
                // interval, not this one.
                self.publish(
                    &mut inner,
                    Phase::InProgress {
                        seconds_left,
                        seconds_total,
                        exercise_index,
                        exercises,
                    },
                );
                self.start_ticker(&mut inner);
                self.dispatch("resumed", self.cues.resumed());
            }
            Phase::PausedBreak {
                seconds_left,
                seconds_total,
                next_exercise_index,
                exercises,
            } => {
                self.publish(
                    &mut inner,
                    Phase::Break {
                        seconds_left,
                        seconds_total,
                        next_exercise_index,
                        exercises,
                    },
                );
                self.start_ticker(&mut inner);
            }
            Phase::NotStarted { .. } => {
                let exercises = self.exercises_rx.borrow().clone();
                if exercises.is_empty() {
                    drop(inner);
                    self.notify(SessionNotice::NoExercises);
                    return;
                }
                let seconds = self.settings_rx.borrow().exercise_seconds;
                inner.elapsed_seconds = 0;
                self.publish(
                    &mut inner,
                    Phase::InProgress {
                        seconds_left: seconds,
                        seconds_total: seconds,
                        exercise_index: 0,
                        exercises,
                    },
                );
                self.start_ticker(&mut inner);
                self.dispatch("session_started", self.cues.session_started());
            }
        }
    }

    /// Pauses the running interval, preserving its countdown.
    fn pause(&self) {
        let mut inner = self.lock_inner();
        match self.current_phase() {
            Phase::InProgress {
                seconds_left,
                seconds_total,
                exercise_index,
                exercises,
            } => {
                // Stop the loop first, then publish: a tick must never
                // land on a paused phase.
                self.stop_ticker(&mut inner);
                self.publish(
                    &mut inner,
                    Phase::PausedTraining {
                        seconds_left,
                        seconds_total,
                        exercise_index,
                        exercises,
                    },
                );
                self.dispatch("paused", self.cues.paused());
            }
            Phase::Break {
                seconds_left,
                seconds_total,
                next_exercise_index,
                exercises,
            } => {
                self.stop_ticker(&mut inner);
                self.publish(
                    &mut inner,
                    Phase::PausedBreak {
                        seconds_left,
                        seconds_total,
                        next_exercise_index,
                        exercises,
                    },
                );
                self.dispatch("paused", self.cues.paused());
            }
            _ => {
                drop(inner);
                self.notify(SessionNotice::NothingToPause);
            }
        }
    }

    /// Stops the session from any phase and resets to not-started.
    fn stop(&self) {
        let mut inner = self.lock_inner();
        self.stop_ticker(&mut inner);
        inner.elapsed_seconds = 0;
        let exercises = self.exercises_rx.borrow().clone();
        self.publish(&mut inner, Phase::NotStarted { exercises });
        self.dispatch("stopped", self.cues.stopped());
    }

    /// Persists an exercise inclusion flag through the directory.
    fn set_exercise_included(&self, id: u32, included: bool) {
        match self.directory.set_included(id, included) {
            Ok(true) => debug!("exercise {} included={}", id, included),
            Ok(false) => warn!("ignoring inclusion update for unknown exercise {}", id),
            Err(e) => warn!("failed to persist inclusion for exercise {}: {}", id, e),
        }
    }

    // ------------------------------------------------------------------------
    // Tick transitions
    // ------------------------------------------------------------------------

    /// Entry point for the timer loop.
    ///
    /// A tick whose generation no longer matches the live loop is from a
    /// loop that was stopped while this tick was in flight; it is
    /// discarded without touching the phase.
    pub(crate) fn on_tick(&self, generation: u64) {
        let mut inner = self.lock_inner();
        match inner.ticker.as_ref() {
            Some(ticker) if ticker.generation() == generation => {}
            _ => return,
        }
        self.apply_tick(&mut inner);
    }

    /// Advances the countdown by one second and applies any resulting
    /// phase transition. Must be called with the transition lock held
    /// and only while a timed phase is current.
    fn apply_tick(&self, inner: &mut SessionInner) {
        match self.current_phase() {
            Phase::InProgress {
                seconds_left,
                seconds_total,
                exercise_index,
                exercises,
            } => {
                inner.elapsed_seconds += 1;
                let seconds_left = seconds_left.saturating_sub(1);
                if seconds_left > 0 {
                    self.publish(
                        inner,
                        Phase::InProgress {
                            seconds_left,
                            seconds_total,
                            exercise_index,
                            exercises,
                        },
                    );
                } else if exercise_index + 1 < exercises.len() {
                    // Exercise finished with more to go: enter a break
                    // using the break duration configured right now.
                    let break_seconds = self.settings_rx.borrow().break_seconds;
                    self.publish(
                        inner,
                        Phase::Break {
                            seconds_left: break_seconds,
                            seconds_total: break_seconds,
                            next_exercise_index: exercise_index + 1,
                            exercises,
                        },
                    );
                    self.dispatch("paused", self.cues.paused());
                } else {
                    // Last exercise finished: the session is complete.
                    self.stop_ticker(inner);
                    let exercise_count = exercises.len() as u32;
                    let total_seconds = inner.elapsed_seconds;
                    inner.elapsed_seconds = 0;
                    self.publish(
                        inner,
                        Phase::NotStarted {
                            exercises: self.exercises_rx.borrow().clone(),
                        },
                    );
                    self.dispatch("stopped", self.cues.stopped());
                    self.notify(SessionNotice::SessionCompleted {
                        exercise_count,
                        total_seconds,
                    });
                }
            }
            Phase::Break {
                seconds_left,
                seconds_total,
                next_exercise_index,
                exercises,
            } => {
                inner.elapsed_seconds += 1;
                let seconds_left = seconds_left.saturating_sub(1);
                if seconds_left > 0 {
                    self.publish(
                        inner,
                        Phase::Break {
                            seconds_left,
                            seconds_total,
                            next_exercise_index,
                            exercises,
                        },
                    );
                } else {
                    // Break finished: begin the next exercise with the
                    // exercise duration configured right now.
                    let exercise_seconds = self.settings_rx.borrow().exercise_seconds;
                    self.publish(
                        inner,
                        Phase::InProgress {
                            seconds_left: exercise_seconds,
                            seconds_total: exercise_seconds,
                            exercise_index: next_exercise_index,
                            exercises,
                        },
                    );
                    self.dispatch("interval_restarted", self.cues.interval_restarted());
                }
            }
            phase => {
                // The loop must already be stopped in untimed phases.
                debug_assert!(false, "tick delivered in phase {}", phase.as_str());
            }
        }
    }

    /// Advances the session by one tick, as the timer loop would.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn tick_now(&self) {
        let mut inner = self.lock_inner();
        self.apply_tick(&mut inner);
    }

    /// Returns true if a timer loop is currently live.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn ticker_running(&self) -> bool {
        self.lock_inner().ticker.is_some()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Acquires the transition lock, recovering from poisoning.
    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the published phase. The `_lock` parameter is a witness
    /// that the caller holds the transition lock.
    fn publish(&self, _lock: &mut SessionInner, phase: Phase) {
        self.phase_tx.send_replace(phase);
    }

    /// Emits a one-shot notice; having no subscribers is fine.
    fn notify(&self, notice: SessionNotice) {
        let _ = self.notice_tx.send(notice);
    }

    /// Logs a failed cue without propagating it.
    fn dispatch(&self, cue: &'static str, result: Result<(), CueError>) {
        if let Err(e) = result {
            warn!("cue '{}' failed: {}", cue, e);
        }
    }

    /// Spawns a new timer loop. Starting while one is live is a contract
    /// violation; release builds recover by replacing the old loop.
    fn start_ticker(self: &Arc<Self>, inner: &mut SessionInner) {
        if inner.ticker.is_some() {
            debug_assert!(false, "timer loop already running");
            warn!("timer loop already running, replacing it");
            self.stop_ticker(inner);
        }
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.ticker = Some(TickerGuard::spawn(Arc::downgrade(self), generation));
    }

    /// Tears down the timer loop. Idempotent; a tick already in flight
    /// is discarded by the generation check in `on_tick`.
    fn stop_ticker(&self, inner: &mut SessionInner) {
        inner.ticker = None;
    }
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("phase", &self.current_phase().as_str())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cue::MockCueSink;

    /// Directory stub recording inclusion updates.
    #[derive(Debug, Default)]
    struct MockDirectory {
        updates: Mutex<Vec<(u32, bool)>>,
    }

    impl ExerciseDirectory for MockDirectory {
        fn set_included(&self, id: u32, included: bool) -> anyhow::Result<bool> {
            self.updates.lock().unwrap().push((id, included));
            Ok(id != 999)
        }
    }

    struct Harness {
        session: Arc<WorkoutSession>,
        settings_tx: watch::Sender<Settings>,
        exercises_tx: watch::Sender<Vec<Exercise>>,
        cues: Arc<MockCueSink>,
        directory: Arc<MockDirectory>,
    }

    fn two_exercises() -> Vec<Exercise> {
        vec![
            Exercise::new(1, "Push-ups", true),
            Exercise::new(2, "Plank", true),
        ]
    }

    fn harness(settings: Settings, exercises: Vec<Exercise>) -> Harness {
        let (settings_tx, settings_rx) = watch::channel(settings);
        let (exercises_tx, exercises_rx) = watch::channel(exercises);
        let cues = Arc::new(MockCueSink::new());
        let directory = Arc::new(MockDirectory::default());
        let session = WorkoutSession::new(
            settings_rx,
            exercises_rx,
            directory.clone(),
            cues.clone(),
        );
        Harness {
            session,
            settings_tx,
            exercises_tx,
            cues,
            directory,
        }
    }

    /// Scenario settings: 10 second exercises, 5 second breaks.
    fn scenario_settings() -> Settings {
        Settings {
            exercise_seconds: 10,
            break_seconds: 5,
        }
    }

    // ------------------------------------------------------------------------
    // Start Tests
    // ------------------------------------------------------------------------

    mod start_tests {
        use super::*;

        #[tokio::test]
        async fn test_start_from_not_started() {
            let h = harness(scenario_settings(), two_exercises());

            h.session.handle(SessionIntent::Start);

            match h.session.current_phase() {
                Phase::InProgress {
                    seconds_left,
                    seconds_total,
                    exercise_index,
                    exercises,
                } => {
                    assert_eq!(seconds_left, 10);
                    assert_eq!(seconds_total, 10);
                    assert_eq!(exercise_index, 0);
                    assert_eq!(exercises.len(), 2);
                }
                phase => panic!("expected InProgress, got {}", phase.as_str()),
            }
            assert!(h.session.ticker_running());
            assert_eq!(h.cues.calls(), vec!["session_started"]);
        }

        #[tokio::test]
        async fn test_start_with_no_exercises_stays_not_started() {
            let h = harness(scenario_settings(), vec![]);
            let mut notices = h.session.observe_notices();

            h.session.handle(SessionIntent::Start);

            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert!(!h.session.ticker_running());
            assert_eq!(notices.try_recv().unwrap(), SessionNotice::NoExercises);
        }

        #[tokio::test]
        async fn test_start_while_in_progress_is_noop() {
            let h = harness(scenario_settings(), two_exercises());
            let mut notices = h.session.observe_notices();

            h.session.handle(SessionIntent::Start);
            let before = h.session.current_phase();
            h.session.handle(SessionIntent::Start);

            assert_eq!(h.session.current_phase(), before);
            assert_eq!(
                notices.try_recv().unwrap(),
                SessionNotice::AlreadyInProgress
            );
            // Only the first start fired a cue.
            assert_eq!(h.cues.calls(), vec!["session_started"]);
        }

        #[tokio::test]
        async fn test_start_samples_current_settings() {
            let h = harness(scenario_settings(), two_exercises());
            h.settings_tx
                .send(Settings {
                    exercise_seconds: 42,
                    break_seconds: 7,
                })
                .unwrap();

            h.session.handle(SessionIntent::Start);

            assert_eq!(h.session.current_phase().seconds_total(), Some(42));
        }
    }

    // ------------------------------------------------------------------------
    // Tick Tests (spec scenarios)
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        /// Scenario A: two exercises, 10s/5s. Full cycle through break,
        /// second exercise and completion.
        #[tokio::test]
        async fn test_full_session_cycle() {
            let h = harness(scenario_settings(), two_exercises());
            let mut notices = h.session.observe_notices();
            h.session.handle(SessionIntent::Start);

            // 10 ticks: countdown to zero enters the break.
            for _ in 0..10 {
                h.session.tick_now();
            }
            match h.session.current_phase() {
                Phase::Break {
                    seconds_left,
                    seconds_total,
                    next_exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 5);
                    assert_eq!(seconds_total, 5);
                    assert_eq!(next_exercise_index, 1);
                }
                phase => panic!("expected Break, got {}", phase.as_str()),
            }

            // 5 ticks: break ends, second exercise begins.
            for _ in 0..5 {
                h.session.tick_now();
            }
            match h.session.current_phase() {
                Phase::InProgress {
                    seconds_left,
                    exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 10);
                    assert_eq!(exercise_index, 1);
                }
                phase => panic!("expected InProgress, got {}", phase.as_str()),
            }

            // 10 ticks: last exercise ends, session completes.
            for _ in 0..10 {
                h.session.tick_now();
            }
            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert!(!h.session.ticker_running());
            assert_eq!(
                notices.try_recv().unwrap(),
                SessionNotice::SessionCompleted {
                    exercise_count: 2,
                    total_seconds: 25,
                }
            );
        }

        #[tokio::test]
        async fn test_tick_republishes_decrement_without_transition() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            h.session.tick_now();

            match h.session.current_phase() {
                Phase::InProgress {
                    seconds_left,
                    seconds_total,
                    ..
                } => {
                    assert_eq!(seconds_left, 9);
                    assert_eq!(seconds_total, 10);
                }
                phase => panic!("expected InProgress, got {}", phase.as_str()),
            }
            // No transition cue beyond the initial start.
            assert_eq!(h.cues.calls(), vec!["session_started"]);
        }

        #[tokio::test]
        async fn test_entering_break_fires_pause_cue() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            for _ in 0..10 {
                h.session.tick_now();
            }

            assert_eq!(h.cues.calls(), vec!["session_started", "paused"]);
        }

        #[tokio::test]
        async fn test_break_end_fires_interval_restart_cue() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            for _ in 0..15 {
                h.session.tick_now();
            }

            assert_eq!(
                h.cues.calls(),
                vec!["session_started", "paused", "interval_restarted"]
            );
        }

        /// Scenario D: a configuration change mid-interval applies to the
        /// next interval only.
        #[tokio::test]
        async fn test_duration_change_applies_to_next_interval() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            // Burn 4 seconds, then change the exercise duration.
            for _ in 0..4 {
                h.session.tick_now();
            }
            h.settings_tx
                .send(Settings {
                    exercise_seconds: 20,
                    break_seconds: 5,
                })
                .unwrap();

            // The running interval still finishes at the original total.
            assert_eq!(h.session.current_phase().seconds_total(), Some(10));
            for _ in 0..6 {
                h.session.tick_now();
            }
            assert!(matches!(h.session.current_phase(), Phase::Break { .. }));

            // The next exercise interval uses the new duration.
            for _ in 0..5 {
                h.session.tick_now();
            }
            match h.session.current_phase() {
                Phase::InProgress {
                    seconds_left,
                    seconds_total,
                    exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 20);
                    assert_eq!(seconds_total, 20);
                    assert_eq!(exercise_index, 1);
                }
                phase => panic!("expected InProgress, got {}", phase.as_str()),
            }
        }

        #[tokio::test]
        async fn test_single_exercise_completes_without_break() {
            let h = harness(
                scenario_settings(),
                vec![Exercise::new(1, "Plank", true)],
            );
            let mut notices = h.session.observe_notices();
            h.session.handle(SessionIntent::Start);

            for _ in 0..10 {
                h.session.tick_now();
            }

            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert_eq!(
                notices.try_recv().unwrap(),
                SessionNotice::SessionCompleted {
                    exercise_count: 1,
                    total_seconds: 10,
                }
            );
        }

        #[tokio::test]
        async fn test_stale_tick_is_discarded() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            h.session.handle(SessionIntent::Pause);

            // A tick from the stopped loop's generation must not land.
            h.session.on_tick(0);

            assert_eq!(h.session.current_phase().seconds_left(), Some(10));
        }
    }

    // ------------------------------------------------------------------------
    // Pause / Resume Tests
    // ------------------------------------------------------------------------

    mod pause_tests {
        use super::*;

        /// Scenario B plus the pause/start round-trip property.
        #[tokio::test]
        async fn test_pause_preserves_countdown_and_stops_loop() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            for _ in 0..6 {
                h.session.tick_now();
            }

            h.session.handle(SessionIntent::Pause);

            match h.session.current_phase() {
                Phase::PausedTraining {
                    seconds_left,
                    seconds_total,
                    exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 4);
                    assert_eq!(seconds_total, 10);
                    assert_eq!(exercise_index, 0);
                }
                phase => panic!("expected PausedTraining, got {}", phase.as_str()),
            }
            assert!(!h.session.ticker_running());
        }

        #[tokio::test]
        async fn test_pause_then_start_round_trip() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            for _ in 0..6 {
                h.session.tick_now();
            }

            h.session.handle(SessionIntent::Pause);
            h.session.handle(SessionIntent::Start);

            match h.session.current_phase() {
                Phase::InProgress {
                    seconds_left,
                    seconds_total,
                    exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 4);
                    assert_eq!(seconds_total, 10);
                    assert_eq!(exercise_index, 0);
                }
                phase => panic!("expected InProgress, got {}", phase.as_str()),
            }
            assert!(h.session.ticker_running());
            assert_eq!(
                h.cues.calls(),
                vec!["session_started", "paused", "resumed"]
            );
        }

        #[tokio::test]
        async fn test_resume_reuses_paused_total_despite_config_change() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            for _ in 0..6 {
                h.session.tick_now();
            }
            h.session.handle(SessionIntent::Pause);

            // Change configuration while paused; the resumed interval
            // must keep its original total.
            h.settings_tx
                .send(Settings {
                    exercise_seconds: 99,
                    break_seconds: 5,
                })
                .unwrap();
            h.session.handle(SessionIntent::Start);

            assert_eq!(h.session.current_phase().seconds_left(), Some(4));
            assert_eq!(h.session.current_phase().seconds_total(), Some(10));
        }

        #[tokio::test]
        async fn test_pause_during_break() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            for _ in 0..12 {
                h.session.tick_now();
            }
            assert!(matches!(h.session.current_phase(), Phase::Break { .. }));

            h.session.handle(SessionIntent::Pause);

            match h.session.current_phase() {
                Phase::PausedBreak {
                    seconds_left,
                    seconds_total,
                    next_exercise_index,
                    ..
                } => {
                    assert_eq!(seconds_left, 3);
                    assert_eq!(seconds_total, 5);
                    assert_eq!(next_exercise_index, 1);
                }
                phase => panic!("expected PausedBreak, got {}", phase.as_str()),
            }
            assert!(!h.session.ticker_running());

            // Resuming a break continues the countdown where it stopped.
            h.session.handle(SessionIntent::Start);
            match h.session.current_phase() {
                Phase::Break { seconds_left, .. } => assert_eq!(seconds_left, 3),
                phase => panic!("expected Break, got {}", phase.as_str()),
            }
            assert!(h.session.ticker_running());
        }

        /// Scenario C: pausing with nothing running emits no phase.
        #[tokio::test]
        async fn test_pause_from_not_started_emits_nothing() {
            let h = harness(scenario_settings(), two_exercises());
            let mut phases = h.session.observe_phase();
            let mut notices = h.session.observe_notices();
            phases.mark_unchanged();

            h.session.handle(SessionIntent::Pause);

            assert!(!phases.has_changed().unwrap());
            assert_eq!(notices.try_recv().unwrap(), SessionNotice::NothingToPause);
        }
    }

    // ------------------------------------------------------------------------
    // Stop Tests
    // ------------------------------------------------------------------------

    mod stop_tests {
        use super::*;

        #[tokio::test]
        async fn test_stop_from_in_progress() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            for _ in 0..3 {
                h.session.tick_now();
            }

            h.session.handle(SessionIntent::Stop);

            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert!(!h.session.ticker_running());
            assert_eq!(h.cues.calls(), vec!["session_started", "stopped"]);
        }

        #[tokio::test]
        async fn test_stop_from_paused() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);
            h.session.handle(SessionIntent::Pause);

            h.session.handle(SessionIntent::Stop);

            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
        }

        #[tokio::test]
        async fn test_stop_twice_is_idempotent() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            h.session.handle(SessionIntent::Stop);
            h.session.handle(SessionIntent::Stop);

            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert!(!h.session.ticker_running());
        }

        #[tokio::test]
        async fn test_not_started_refreshes_active_list_on_stop() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            // The active list changes mid-session.
            h.exercises_tx
                .send(vec![Exercise::new(3, "Squats", true)])
                .unwrap();

            // The live snapshot is unaffected.
            assert_eq!(h.session.current_phase().exercises().len(), 2);

            // After stop, the fresh list is visible.
            h.session.handle(SessionIntent::Stop);
            let phase = h.session.current_phase();
            assert_eq!(phase.exercises().len(), 1);
            assert_eq!(phase.exercises()[0].name, "Squats");
        }
    }

    // ------------------------------------------------------------------------
    // Inclusion / Cue Failure Tests
    // ------------------------------------------------------------------------

    mod misc_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_exercise_included_goes_through_directory() {
            let h = harness(scenario_settings(), two_exercises());

            h.session.handle(SessionIntent::SetExerciseIncluded {
                id: 2,
                included: false,
            });

            assert_eq!(*h.directory.updates.lock().unwrap(), vec![(2, false)]);
        }

        #[tokio::test]
        async fn test_unknown_exercise_id_is_logged_not_fatal() {
            let h = harness(scenario_settings(), two_exercises());

            h.session.handle(SessionIntent::SetExerciseIncluded {
                id: 999,
                included: true,
            });

            // Still recorded by the mock; the session itself is unchanged.
            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
        }

        #[tokio::test]
        async fn test_cue_failures_do_not_block_transitions() {
            let h = harness(scenario_settings(), two_exercises());
            h.cues.fail_all();

            h.session.handle(SessionIntent::Start);
            h.session.handle(SessionIntent::Pause);
            h.session.handle(SessionIntent::Stop);

            // All transitions completed despite every cue failing.
            assert!(matches!(
                h.session.current_phase(),
                Phase::NotStarted { .. }
            ));
            assert_eq!(
                h.cues.calls(),
                vec!["session_started", "paused", "stopped"]
            );
        }

        #[tokio::test]
        async fn test_phase_stream_replays_latest_on_subscribe() {
            let h = harness(scenario_settings(), two_exercises());
            h.session.handle(SessionIntent::Start);

            let phases = h.session.observe_phase();
            assert!(matches!(*phases.borrow(), Phase::InProgress { .. }));
        }
    }
}
