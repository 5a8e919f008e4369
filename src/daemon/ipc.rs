//! IPC Server for the Workout Timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for session commands
//! - Dispatch onto the workout session and the state stores

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::session::{SessionIntent, WorkoutSession};
use crate::store::{ExerciseStore, HistoryStore, SettingsStore};
use crate::types::{IpcRequest, IpcResponse, Phase, ResponseData};

// ============================================================================
// Constants
// ============================================================================

/// Name of the socket file inside the state directory.
pub const SOCKET_FILE: &str = "workout.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("Failed to bind socket: {0}")]
    BindError(String),

    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before
    /// binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("Connection closed by client");
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the session and stores.
pub struct RequestHandler {
    /// The workout session
    session: Arc<WorkoutSession>,
    /// Duration configuration store
    settings: Arc<SettingsStore>,
    /// Exercise list store
    exercises: Arc<ExerciseStore>,
    /// Workout history store
    history: Arc<HistoryStore>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(
        session: Arc<WorkoutSession>,
        settings: Arc<SettingsStore>,
        exercises: Arc<ExerciseStore>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            session,
            settings,
            exercises,
            history,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start(),
            IpcRequest::Pause => self.handle_pause(),
            IpcRequest::Stop => self.handle_stop(),
            IpcRequest::Status => self.handle_status(),
            IpcRequest::Exercises => self.handle_exercises(),
            IpcRequest::Include { id, included } => self.handle_include(id, included),
            IpcRequest::Durations {
                exercise_seconds,
                break_seconds,
            } => self.handle_durations(exercise_seconds, break_seconds),
            IpcRequest::History => self.handle_history(),
            IpcRequest::HistoryClear => self.handle_history_clear(),
        }
    }

    /// Handles the start command.
    fn handle_start(&self) -> IpcResponse {
        let before = self.session.current_phase();
        if before.is_timed() {
            return IpcResponse::error("ワークアウトは既に実行中です");
        }
        let resuming = before.is_paused();

        self.session.handle(SessionIntent::Start);

        let after = self.session.current_phase();
        if !after.is_timed() {
            // The only silent start failure is an empty active list.
            return IpcResponse::error("有効なエクササイズがありません");
        }
        let message = if resuming {
            "ワークアウトを再開しました"
        } else {
            "ワークアウトを開始しました"
        };
        IpcResponse::success(message, Some(ResponseData::from_phase(&after)))
    }

    /// Handles the pause command.
    fn handle_pause(&self) -> IpcResponse {
        if !self.session.current_phase().is_timed() {
            return IpcResponse::error("実行中のワークアウトはありません");
        }

        self.session.handle(SessionIntent::Pause);

        let after = self.session.current_phase();
        IpcResponse::success(
            "ワークアウトを一時停止しました",
            Some(ResponseData::from_phase(&after)),
        )
    }

    /// Handles the stop command.
    fn handle_stop(&self) -> IpcResponse {
        self.session.handle(SessionIntent::Stop);

        let after = self.session.current_phase();
        IpcResponse::success(
            "ワークアウトを停止しました",
            Some(ResponseData::from_phase(&after)),
        )
    }

    /// Handles the status query.
    fn handle_status(&self) -> IpcResponse {
        let phase = self.session.current_phase();
        let mut data = ResponseData::from_phase(&phase);
        data.settings = Some(self.settings.current());
        IpcResponse::success("現在のステータス", Some(data))
    }

    /// Handles the exercises listing.
    fn handle_exercises(&self) -> IpcResponse {
        let data = ResponseData {
            exercises: Some(self.exercises.all()),
            ..ResponseData::default()
        };
        IpcResponse::success("エクササイズ一覧", Some(data))
    }

    /// Handles an exercise inclusion update.
    fn handle_include(&self, id: u32, included: bool) -> IpcResponse {
        let known = self.exercises.all().iter().any(|e| e.id == id);
        if !known {
            return IpcResponse::error("指定されたエクササイズが見つかりません");
        }

        self.session
            .handle(SessionIntent::SetExerciseIncluded { id, included });

        let message = if included {
            "エクササイズをワークアウトに追加しました"
        } else {
            "エクササイズをワークアウトから除外しました"
        };
        let data = ResponseData {
            exercises: Some(self.exercises.all()),
            ..ResponseData::default()
        };
        IpcResponse::success(message, Some(data))
    }

    /// Handles a duration configuration read or update.
    fn handle_durations(
        &self,
        exercise_seconds: Option<u32>,
        break_seconds: Option<u32>,
    ) -> IpcResponse {
        if exercise_seconds.is_none() && break_seconds.is_none() {
            let data = ResponseData {
                settings: Some(self.settings.current()),
                ..ResponseData::default()
            };
            return IpcResponse::success("現在の時間設定", Some(data));
        }

        let result = self.settings.save(|mut s| {
            if let Some(seconds) = exercise_seconds {
                s.exercise_seconds = seconds;
            }
            if let Some(seconds) = break_seconds {
                s.break_seconds = seconds;
            }
            s
        });

        match result {
            Ok(updated) => {
                let data = ResponseData {
                    settings: Some(updated),
                    ..ResponseData::default()
                };
                IpcResponse::success("時間設定を更新しました", Some(data))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the history listing.
    fn handle_history(&self) -> IpcResponse {
        let entries: Vec<_> = self.history.all().iter().map(|r| r.to_entry()).collect();
        let message = format!("{}件のワークアウト履歴", entries.len());
        let data = ResponseData {
            history: Some(entries),
            ..ResponseData::default()
        };
        IpcResponse::success(message, Some(data))
    }

    /// Handles clearing the history.
    fn handle_history_clear(&self) -> IpcResponse {
        match self.history.clear() {
            Ok(()) => IpcResponse::success("ワークアウト履歴を削除しました", None),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Returns the session's current phase (for daemon-side logging).
    pub fn current_phase(&self) -> Phase {
        self.session.current_phase()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockCueSink;
    use crate::store::{CONFIG_FILE, EXERCISES_FILE, HISTORY_FILE};

    struct Fixture {
        _dir: tempfile::TempDir,
        handler: RequestHandler,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::load(dir.path().join(CONFIG_FILE)));
        let exercises = Arc::new(ExerciseStore::load(dir.path().join(EXERCISES_FILE)));
        let history = Arc::new(HistoryStore::load(dir.path().join(HISTORY_FILE)));
        let session = WorkoutSession::new(
            settings.subscribe(),
            exercises.subscribe_active(),
            exercises.clone(),
            Arc::new(MockCueSink::new()),
        );
        Fixture {
            _dir: dir,
            handler: RequestHandler::new(session, settings, exercises, history),
        }
    }

    #[tokio::test]
    async fn test_start_then_status() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Start);
        assert_eq!(response.status, "success");
        let data = response.data.unwrap();
        assert_eq!(data.state, Some("in_progress".to_string()));
        assert_eq!(data.seconds_left, Some(60));

        let response = f.handler.handle(IpcRequest::Status);
        assert_eq!(response.status, "success");
        let data = response.data.unwrap();
        assert_eq!(data.state, Some("in_progress".to_string()));
        assert!(data.settings.is_some());
    }

    #[tokio::test]
    async fn test_start_twice_reports_already_running() {
        let f = fixture();

        f.handler.handle(IpcRequest::Start);
        let response = f.handler.handle(IpcRequest::Start);

        assert_eq!(response.status, "error");
        assert!(response.message.contains("既に実行中"));
    }

    #[tokio::test]
    async fn test_pause_without_session_is_an_error_response() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Pause);

        assert_eq!(response.status, "error");
    }

    #[tokio::test]
    async fn test_pause_and_resume_round_trip() {
        let f = fixture();

        f.handler.handle(IpcRequest::Start);
        let response = f.handler.handle(IpcRequest::Pause);
        assert_eq!(response.status, "success");
        assert_eq!(
            response.data.unwrap().state,
            Some("paused_training".to_string())
        );

        let response = f.handler.handle(IpcRequest::Start);
        assert_eq!(response.status, "success");
        assert!(response.message.contains("再開"));
    }

    #[tokio::test]
    async fn test_stop_is_always_successful() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Stop);
        assert_eq!(response.status, "success");
        assert_eq!(
            response.data.unwrap().state,
            Some("not_started".to_string())
        );

        // Stopping again is still a success (idempotent).
        let response = f.handler.handle(IpcRequest::Stop);
        assert_eq!(response.status, "success");
    }

    #[tokio::test]
    async fn test_exercises_listing() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Exercises);

        assert_eq!(response.status, "success");
        let exercises = response.data.unwrap().exercises.unwrap();
        assert_eq!(exercises.len(), 12);
    }

    #[tokio::test]
    async fn test_include_unknown_exercise() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Include {
            id: 999,
            included: true,
        });

        assert_eq!(response.status, "error");
    }

    #[tokio::test]
    async fn test_include_updates_listing() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Include {
            id: 1,
            included: false,
        });

        assert_eq!(response.status, "success");
        let exercises = response.data.unwrap().exercises.unwrap();
        let first = exercises.iter().find(|e| e.id == 1).unwrap();
        assert!(!first.included);
    }

    #[tokio::test]
    async fn test_durations_read_and_update() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Durations {
            exercise_seconds: None,
            break_seconds: None,
        });
        assert_eq!(response.status, "success");
        let settings = response.data.unwrap().settings.unwrap();
        assert_eq!(settings.exercise_seconds, 60);

        let response = f.handler.handle(IpcRequest::Durations {
            exercise_seconds: Some(90),
            break_seconds: Some(20),
        });
        assert_eq!(response.status, "success");
        let settings = response.data.unwrap().settings.unwrap();
        assert_eq!(settings.exercise_seconds, 90);
        assert_eq!(settings.break_seconds, 20);
    }

    #[tokio::test]
    async fn test_durations_rejects_invalid_values() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::Durations {
            exercise_seconds: Some(0),
            break_seconds: None,
        });

        assert_eq!(response.status, "error");
    }

    #[tokio::test]
    async fn test_history_listing_and_clear() {
        let f = fixture();

        let response = f.handler.handle(IpcRequest::History);
        assert_eq!(response.status, "success");
        assert!(response.data.unwrap().history.unwrap().is_empty());

        let response = f.handler.handle(IpcRequest::HistoryClear);
        assert_eq!(response.status, "success");
    }
}
