//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Live session configuration
    #[serde(default)]
    pub live: LiveConfig,

    /// Booking defaults
    #[serde(default)]
    pub booking: BookingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live.input_sample_rate == 0 || self.live.output_sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.input_sample_rate".to_string(),
                message: "Sample rates must be positive".to_string(),
            });
        }
        if self.live.capture_chunk == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.capture_chunk".to_string(),
                message: "Capture chunk must be positive".to_string(),
            });
        }
        if self.live.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.connect_timeout_ms".to_string(),
                message: "Connect timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Live session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Model identifier for the remote agent
    #[serde(default = "default_model")]
    pub model: String,

    /// Synthesized voice identity
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// WebSocket endpoint of the live API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Deadline for the session handshake in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Microphone capture rate in Hz
    #[serde(default = "default_input_sample_rate")]
    pub input_sample_rate: u32,

    /// Agent playback rate in Hz
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,

    /// Capture buffer size in samples
    #[serde(default = "default_capture_chunk")]
    pub capture_chunk: usize,
}

fn default_model() -> String {
    "gemini-2.5-flash-native-audio-preview-09-2025".to_string()
}
fn default_voice() -> String {
    "Puck".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_endpoint() -> String {
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_input_sample_rate() -> u32 {
    16_000
}
fn default_output_sample_rate() -> u32 {
    24_000
}
fn default_capture_chunk() -> usize {
    4096
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            voice: default_voice(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            input_sample_rate: default_input_sample_rate(),
            output_sample_rate: default_output_sample_rate(),
            capture_chunk: default_capture_chunk(),
        }
    }
}

/// Booking defaults used by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Worker to book
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// Worker's profession
    #[serde(default = "default_worker_profession")]
    pub worker_profession: String,
}

fn default_worker_name() -> String {
    "Ramesh Kumar".to_string()
}
fn default_worker_profession() -> String {
    "Plumber".to_string()
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            worker_name: default_worker_name(),
            worker_profession: default_worker_profession(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (THEKEDAAR_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("THEKEDAAR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
