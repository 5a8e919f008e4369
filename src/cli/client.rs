//! IPC Client for communicating with the Workout Timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::SOCKET_FILE;
use crate::store::default_state_dir;
use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let socket_path = default_state_dir()
            .context("状態ディレクトリを決定できません")?
            .join(SOCKET_FILE);
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Start).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause).await
    }

    /// Sends a stop command to the daemon.
    pub async fn stop(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Stop).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Requests the full exercise list.
    pub async fn exercises(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Exercises).await
    }

    /// Updates an exercise's inclusion flag.
    pub async fn include(&self, id: u32, included: bool) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Include { id, included })
            .await
    }

    /// Reads or updates the duration configuration.
    pub async fn durations(
        &self,
        exercise_seconds: Option<u32>,
        break_seconds: Option<u32>,
    ) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Durations {
            exercise_seconds,
            break_seconds,
        })
        .await
    }

    /// Requests the workout history.
    pub async fn history(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::History).await
    }

    /// Clears the workout history.
    pub async fn history_clear(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::HistoryClear).await
    }

    /// Sends a request to the daemon with retry logic.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(Duration::from_millis(
                            RETRY_DELAY_MS * u64::from(attempt),
                        ))
                        .await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("リクエストの送信に失敗しました"))
            .context("デーモンに接続できません。`workout daemon` が起動していますか?"))
    }

    /// Sends a single request and reads the response.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        // Connect with timeout
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .with_context(|| format!("ソケットに接続できません: {:?}", self.socket_path))?;

        // Send request
        let json = serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(&json),
        )
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;
        stream
            .flush()
            .await
            .context("リクエストのフラッシュに失敗しました")?;
        stream
            .shutdown()
            .await
            .context("書き込み側のクローズに失敗しました")?;

        // Read response
        let mut buffer = Vec::with_capacity(1024);
        let mut chunk = vec![0u8; 4096];
        loop {
            let n = timeout(
                Duration::from_secs(IO_TIMEOUT_SECS),
                stream.read(&mut chunk),
            )
            .await
            .context("読み込みがタイムアウトしました")?
            .context("レスポンスの読み込みに失敗しました")?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > MAX_RESPONSE_SIZE {
                anyhow::bail!("レスポンスが大きすぎます");
            }
        }

        if buffer.is_empty() {
            anyhow::bail!("デーモンからの応答がありません");
        }

        let response: IpcResponse = serde_json::from_slice(&buffer)
            .context("レスポンスのデシリアライズに失敗しました")?;
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
