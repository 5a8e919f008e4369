//! Sound system error types.

use thiserror::Error;

use crate::session::CueError;

/// Errors that can occur in the music playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// Failed to create the audio output stream or sink.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    /// Generic playback error.
    #[error("サウンド再生エラー: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }
}

impl From<SoundError> for CueError {
    fn from(err: SoundError) -> Self {
        match err {
            SoundError::DeviceNotAvailable(m) | SoundError::StreamError(m) => {
                CueError::Unavailable(m)
            }
            SoundError::PlaybackError(m) => CueError::Playback(m),
        }
    }
}
