//! Error types for the voice booking assistant

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the voice booking assistant
#[derive(Error, Debug)]
pub enum Error {
    // Audio errors
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    // Session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // Tool errors
    #[error("Tool error: {0}")]
    Tool(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Audio codec errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Live session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connect timeout after {0}ms")]
    ConnectTimeout(u64),

    #[error("Session closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
