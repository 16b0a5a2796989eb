//! Configuration for the Thekedaar live voice booking assistant
//!
//! Settings are layered: `config/default` file, then an optional
//! environment-specific file, then `THEKEDAAR__`-prefixed environment
//! variables (double underscore as the section separator, e.g.
//! `THEKEDAAR__LIVE__MODEL`).

pub mod settings;

pub use settings::{
    load_settings, BookingConfig, LiveConfig, ObservabilityConfig, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
