//! Audio clocks, playback scheduling and capture
//!
//! The playback side owns the one protocol-level invariant of the live
//! session: inbound agent audio plays back-to-back with no gaps or
//! overlaps, and an interruption (barge-in) silences everything that is
//! queued and resets the schedule to "now".
//!
//! Capture and playback run on independent clocks; nothing in this crate
//! assumes they agree.

pub mod capture;
pub mod clock;
pub mod playback;

#[cfg(feature = "devices")]
pub mod devices;

pub use capture::CaptureSource;
pub use clock::{OutputClock, SystemClock};
pub use playback::{PlaybackHandle, PlaybackScheduler, PlaybackSink};

#[cfg(feature = "devices")]
pub use devices::{CpalCapture, CpalPlayback};

use thiserror::Error;

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Capture device unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Playback device unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("Capture already running")]
    CaptureRunning,

    #[error("Invalid audio data: {0}")]
    InvalidData(String),

    #[error("Device stream error: {0}")]
    Stream(String),
}

impl From<AudioError> for thekedaar_voice_core::Error {
    fn from(err: AudioError) -> Self {
        thekedaar_voice_core::Error::Audio(thekedaar_voice_core::error::AudioError::InvalidFormat(
            err.to_string(),
        ))
    }
}
