//! Daemon runtime for the Workout Timer.
//!
//! The daemon owns the single workout session per running instance. It
//! wires the stores to the state machine, serves IPC requests on the
//! Unix socket and records completed sessions into the history store.
//! Session state is ephemeral: a daemon restart always begins in the
//! not-started phase.

pub mod ipc;

pub use ipc::{IpcError, IpcServer, RequestHandler, SOCKET_FILE};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::session::{CueSink, NullCueSink, SessionIntent, SessionNotice, WorkoutSession};
use crate::sound::RodioCuePlayer;
use crate::store::{
    default_state_dir, ExerciseStore, HistoryStore, SettingsStore, WorkoutRecord, CONFIG_FILE,
    EXERCISES_FILE, HISTORY_FILE,
};

/// Daemon startup options.
#[derive(Debug, Default, Clone)]
pub struct DaemonOptions {
    /// State directory override (defaults to `~/.workout`)
    pub state_dir: Option<PathBuf>,
    /// Disable audio playback
    pub no_sound: bool,
}

/// Runs the daemon until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the state directory cannot be determined or the
/// IPC socket cannot be bound. Per-connection failures are logged and
/// do not terminate the daemon.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let state_dir = match options.state_dir {
        Some(dir) => dir,
        None => default_state_dir().context("状態ディレクトリを決定できません")?,
    };

    let settings = Arc::new(SettingsStore::load(state_dir.join(CONFIG_FILE)));
    let exercises = Arc::new(ExerciseStore::load(state_dir.join(EXERCISES_FILE)));
    let history = Arc::new(HistoryStore::load(state_dir.join(HISTORY_FILE)));

    let cues = build_cue_sink(options.no_sound);
    let session = WorkoutSession::new(
        settings.subscribe(),
        exercises.subscribe_active(),
        exercises.clone(),
        cues,
    );

    spawn_history_recorder(session.observe_notices(), history.clone());

    let server = IpcServer::new(&state_dir.join(SOCKET_FILE))?;
    let handler = RequestHandler::new(session.clone(), settings, exercises, history);
    info!("daemon listening on {:?}", server.socket_path());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = server.accept() => match result {
                Ok(mut stream) => match IpcServer::receive_request(&mut stream).await {
                    Ok(request) => {
                        let response = handler.handle(request);
                        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                            warn!("failed to send response: {}", e);
                        }
                    }
                    Err(e) => warn!("failed to read request: {}", e),
                },
                Err(e) => warn!("failed to accept connection: {}", e),
            },
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("signal handler failed: {}", e);
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Stop the session so audio resources are released before exit.
    session.handle(SessionIntent::Stop);
    Ok(())
}

/// Builds the session's cue sink, falling back to silence when audio is
/// unavailable.
fn build_cue_sink(no_sound: bool) -> Arc<dyn CueSink> {
    if no_sound {
        return Arc::new(NullCueSink);
    }
    match RodioCuePlayer::new(false) {
        Ok(player) => Arc::new(player),
        Err(e) => {
            warn!("audio unavailable, running without sound: {}", e);
            Arc::new(NullCueSink)
        }
    }
}

/// Appends a history record for every completed session.
fn spawn_history_recorder(
    mut notices: broadcast::Receiver<SessionNotice>,
    history: Arc<HistoryStore>,
) {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(SessionNotice::SessionCompleted {
                    exercise_count,
                    total_seconds,
                }) => {
                    let record = WorkoutRecord::new(total_seconds, exercise_count);
                    match history.append(record) {
                        Ok(()) => info!(
                            "workout recorded: {} exercises in {}s",
                            exercise_count, total_seconds
                        ),
                        Err(e) => warn!("failed to record workout: {}", e),
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("history recorder lagged, {} notices missed", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
