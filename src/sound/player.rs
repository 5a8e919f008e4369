//! Music player implementation using rodio.
//!
//! The player keeps one looping background track alive for the duration
//! of a workout session: started fresh for each exercise interval,
//! paused over breaks and pauses, and released when the session stops.
//!
//! rodio's output stream is not `Send`, so the player owns a dedicated
//! audio thread and forwards lifecycle commands to it over a channel.
//! Every [`CueSink`] call is therefore non-blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use crate::session::{CueError, CueSink};

use super::error::SoundError;

/// Frequency of the synthesized workout track in Hz.
const TRACK_FREQUENCY_HZ: f32 = 440.0;

/// Playback volume of the synthesized track.
const TRACK_VOLUME: f32 = 0.15;

/// Lifecycle commands understood by the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioCommand {
    /// Start the track from the beginning
    Restart,
    /// Resume a paused track (or start one if none is live)
    Resume,
    /// Pause the track
    Pause,
    /// Stop the track and drop the sink
    Release,
}

/// A session music player backed by rodio.
///
/// The player is thread-safe and can be shared across threads using
/// `Arc`. Releasing an already-released player is a no-op.
pub struct RodioCuePlayer {
    /// Command channel into the audio thread.
    commands: Sender<AudioCommand>,
    /// Whether playback is disabled.
    disabled: AtomicBool,
}

impl RodioCuePlayer {
    /// Creates a new player and spawns its audio thread.
    ///
    /// # Arguments
    ///
    /// * `disabled` - If true, all playback is silently skipped.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output
    /// device is available.
    pub fn new(disabled: bool) -> Result<Self, SoundError> {
        let (command_tx, command_rx) = unbounded();
        let (ready_tx, ready_rx) = unbounded();

        thread::Builder::new()
            .name("workout-audio".to_string())
            .spawn(move || audio_thread(command_rx, ready_tx))
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                commands: command_tx,
                disabled: AtomicBool::new(disabled),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SoundError::StreamError(
                "audio thread exited during startup".to_string(),
            )),
        }
    }

    /// Creates a disabled player.
    ///
    /// All cue calls succeed without producing sound. May still fail if
    /// the audio stream itself cannot be initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be created.
    pub fn disabled() -> Result<Self, SoundError> {
        Self::new(true)
    }

    /// Returns true if playback is currently disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Forwards a command to the audio thread.
    fn send(&self, command: AudioCommand) -> Result<(), CueError> {
        if self.is_disabled() {
            return Ok(());
        }
        self.commands
            .send(command)
            .map_err(|_| CueError::Unavailable("audio thread is not running".to_string()))
    }
}

impl CueSink for RodioCuePlayer {
    fn session_started(&self) -> Result<(), CueError> {
        self.send(AudioCommand::Restart)
    }

    fn interval_restarted(&self) -> Result<(), CueError> {
        self.send(AudioCommand::Restart)
    }

    fn resumed(&self) -> Result<(), CueError> {
        self.send(AudioCommand::Resume)
    }

    fn paused(&self) -> Result<(), CueError> {
        self.send(AudioCommand::Pause)
    }

    fn stopped(&self) -> Result<(), CueError> {
        self.send(AudioCommand::Release)
    }
}

impl std::fmt::Debug for RodioCuePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioCuePlayer")
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// The audio thread: owns the output stream and the live sink.
///
/// Exits when the player (the command sender) is dropped.
fn audio_thread(commands: Receiver<AudioCommand>, ready: Sender<Result<(), SoundError>>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            let _ = ready.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    debug!("Audio thread started");

    let mut sink: Option<Sink> = None;
    while let Ok(command) = commands.recv() {
        match command {
            AudioCommand::Restart => {
                if let Some(live) = sink.take() {
                    live.stop();
                }
                match fresh_sink(&handle) {
                    Ok(live) => {
                        sink = Some(live);
                        debug!("Track restarted");
                    }
                    Err(e) => warn!("failed to restart track: {}", e),
                }
            }
            AudioCommand::Resume => match sink.as_ref() {
                Some(live) => {
                    live.play();
                    debug!("Track resumed");
                }
                None => match fresh_sink(&handle) {
                    Ok(live) => sink = Some(live),
                    Err(e) => warn!("failed to resume track: {}", e),
                },
            },
            AudioCommand::Pause => {
                if let Some(live) = sink.as_ref() {
                    live.pause();
                    debug!("Track paused");
                }
            }
            AudioCommand::Release => {
                if let Some(live) = sink.take() {
                    live.stop();
                    debug!("Track released");
                }
            }
        }
    }

    debug!("Audio thread exiting");
}

/// Builds a sink with the looping session track queued and playing.
fn fresh_sink(handle: &OutputStreamHandle) -> Result<Sink, SoundError> {
    let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
    let track = SineWave::new(TRACK_FREQUENCY_HZ).amplify(TRACK_VOLUME);
    sink.append(track);
    Ok(sink)
}

// ============================================================================
// Tests
// ============================================================================
