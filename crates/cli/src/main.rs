//! Thekedaar voice booking assistant entry point
//!
//! Runs one live booking session from the terminal: microphone in,
//! agent speech out, booking confirmations printed as they happen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use thekedaar_voice_audio::{CpalCapture, CpalPlayback, PlaybackSink};
use thekedaar_voice_config::{load_settings, Settings};
use thekedaar_voice_core::Worker;
use thekedaar_voice_live::{
    GeminiLiveConnector, SessionConfig, SessionEvent, VoiceBookingSession,
};
use thekedaar_voice_tools::{ConfirmBookingTool, ToolRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(std::env::var("THEKEDAAR_ENV").ok().as_deref())?;
    init_tracing(&settings);

    tracing::info!(
        "Starting Thekedaar voice booking assistant v{}",
        env!("CARGO_PKG_VERSION")
    );

    let api_key = std::env::var(&settings.live.api_key_env)
        .map_err(|_| format!("API key not set: export {}", settings.live.api_key_env))?;

    let connector = Arc::new(
        GeminiLiveConnector::new(api_key).with_endpoint(settings.live.endpoint.clone()),
    );
    let capture = Box::new(CpalCapture::new(
        settings.live.input_sample_rate,
        settings.live.capture_chunk,
    ));
    let playback = Arc::new(CpalPlayback::new(settings.live.output_sample_rate)?);
    let clock = playback.clock();
    let sink: Arc<dyn PlaybackSink> = playback;

    let worker = Worker::new(
        &settings.booking.worker_name,
        &settings.booking.worker_profession,
    );

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(ConfirmBookingTool::new(Arc::new(
        |date: &str, time: &str| {
            tracing::info!(date, time, "booking recorded");
        },
    ))));

    let config = SessionConfig {
        model: settings.live.model.clone(),
        voice: settings.live.voice.clone(),
        connect_timeout: Duration::from_millis(settings.live.connect_timeout_ms),
        input_sample_rate: settings.live.input_sample_rate,
        output_sample_rate: settings.live.output_sample_rate,
    };

    let session = VoiceBookingSession::new(
        worker.clone(),
        config,
        connector,
        capture,
        clock,
        sink,
        Arc::new(tools),
    );
    let mut events = session.subscribe();

    println!("Connecting to the booking assistant for {}...", worker.name);
    if let Err(e) = session.start().await {
        eprintln!("Could not connect: {}", e);
        return Ok(());
    }
    println!("Listening. Talk to the assistant; Ctrl-C hangs up.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Hanging up.");
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::BookingConfirmed { date, time }) => {
                    println!("Booking confirmed: {} on {} at {}", worker.name, date, time);
                }
                Ok(SessionEvent::AgentError { message }) => {
                    tracing::warn!("agent error: {}", message);
                }
                Ok(SessionEvent::Closed) => {
                    println!("The assistant ended the session.");
                    break;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    session.close().await;
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(&settings.observability.log_level)
    });

    if settings.observability.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
