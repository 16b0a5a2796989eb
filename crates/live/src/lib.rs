//! Live duplex voice booking session
//!
//! Bridges local microphone capture to a remote conversational agent and
//! the agent's audio/tool output back to local playback and the host
//! application's booking flow. One session object owns exactly one live
//! interaction; a new attempt requires a new session.
//!
//! The session consumes agent events one at a time from a single
//! channel, which serializes audio scheduling against barge-in handling
//! without sharing mutable scheduling state across callbacks.

pub mod event;
pub mod gemini;
pub mod prompt;
pub mod session;
pub mod traits;

pub use event::{AgentEvent, FunctionCall};
pub use gemini::GeminiLiveConnector;
pub use prompt::booking_instruction;
pub use session::{SessionConfig, SessionEvent, SessionState, VoiceBookingSession};
pub use traits::{LiveConnector, LiveTransport, SessionSetup};

use thiserror::Error;

/// Live session errors
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Connect timeout after {0}ms")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session closed")]
    Closed,
}

impl From<LiveError> for thekedaar_voice_core::Error {
    fn from(err: LiveError) -> Self {
        use thekedaar_voice_core::error::SessionError;
        let session = match err {
            LiveError::Device(msg) | LiveError::Connect(msg) => {
                SessionError::ConnectionFailed(msg)
            }
            LiveError::Timeout(ms) => SessionError::ConnectTimeout(ms),
            LiveError::Transport(msg) => SessionError::Transport(msg),
            LiveError::Closed => SessionError::Closed,
        };
        thekedaar_voice_core::Error::Session(session)
    }
}
