//! Voice booking session manager
//!
//! Owns the lifecycle of one bidirectional audio session with the remote
//! booking agent: microphone capture and framing, inbound audio
//! scheduling, tool-call handling with immediate acknowledgment, and
//! barge-in.
//!
//! Startup order matters: the microphone is acquired first, and a
//! failure there is terminal with no remote connection attempted. The
//! remote open runs under a connect timeout. All shutdown steps are
//! best-effort and run even if earlier ones fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use thekedaar_voice_audio::{CaptureSource, OutputClock, PlaybackScheduler, PlaybackSink};
use thekedaar_voice_core::{pcm, AudioFrame, Channels, SampleRate, Worker};
use thekedaar_voice_tools::{ConfirmBookingTool, ToolRegistry};

use crate::event::{AgentEvent, FunctionCall};
use crate::prompt::booking_instruction;
use crate::traits::{LiveConnector, LiveTransport, SessionSetup};
use crate::LiveError;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model identifier for the remote agent
    pub model: String,
    /// Synthesized voice identity
    pub voice: String,
    /// Deadline for the remote session handshake
    pub connect_timeout: Duration,
    /// Microphone capture rate in Hz
    pub input_sample_rate: u32,
    /// Agent playback rate in Hz
    pub output_sample_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Puck".to_string(),
            connect_timeout: Duration::from_secs(10),
            input_sample_rate: 16_000,
            output_sample_rate: 24_000,
        }
    }
}

/// Connection state of a session
///
/// There is no transition out of `Closed`; a new session object is
/// required for a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

/// Events surfaced to the host UI
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State transition
    StateChanged { old: SessionState, new: SessionState },
    /// Startup failed; the session is terminal ("could not connect")
    ConnectFailed { reason: String },
    /// The agent confirmed a booking
    BookingConfirmed { date: String, time: String },
    /// Non-fatal agent-side error; the session continues
    AgentError { message: String },
    /// The session ended
    Closed,
}

struct Shared {
    state: RwLock<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.read()
    }

    fn set_state(&self, new: SessionState) {
        let old = {
            let mut state = self.state.write();
            let old = *state;
            *state = new;
            old
        };
        if old != new {
            self.emit(SessionEvent::StateChanged { old, new });
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Manager for one live voice booking interaction
pub struct VoiceBookingSession {
    id: String,
    config: SessionConfig,
    worker: Worker,
    connector: Arc<dyn LiveConnector>,
    capture: Mutex<Box<dyn CaptureSource>>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    tools: Arc<ToolRegistry>,
    transport: RwLock<Option<Arc<dyn LiveTransport>>>,
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl VoiceBookingSession {
    /// Create a session for booking `worker`.
    ///
    /// The registry must contain the tools declared to the agent
    /// (typically [`ConfirmBookingTool`] wired to the host's booking
    /// sink). Nothing connects until [`start`](Self::start).
    pub fn new(
        worker: Worker,
        config: SessionConfig,
        connector: Arc<dyn LiveConnector>,
        capture: Box<dyn CaptureSource>,
        clock: Arc<dyn OutputClock>,
        playback: Arc<dyn PlaybackSink>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            worker,
            connector,
            capture: Mutex::new(capture),
            scheduler: Arc::new(Mutex::new(PlaybackScheduler::new(clock, playback))),
            tools,
            transport: RwLock::new(None),
            shared: Arc::new(Shared {
                state: RwLock::new(SessionState::Connecting),
                event_tx,
            }),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current connection state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Run the startup sequence: acquire the microphone, open the remote
    /// session, then begin streaming both directions.
    ///
    /// Any failure is terminal for this session: the state resolves to
    /// `Closed` with a [`SessionEvent::ConnectFailed`], and no retry is
    /// attempted.
    pub async fn start(&self) -> Result<(), LiveError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LiveError::Closed);
        }

        // Microphone first: without it there is nothing to say, so the
        // remote session is never even attempted.
        let (frame_tx, frame_rx) = mpsc::channel::<Vec<f32>>(32);
        if let Err(e) = self.capture.lock().start(frame_tx) {
            let reason = format!("microphone unavailable: {}", e);
            tracing::error!(session = %self.id, "{}", reason);
            self.fail_connect(reason);
            return Err(LiveError::Device(e.to_string()));
        }

        let setup = SessionSetup {
            model: self.config.model.clone(),
            voice: self.config.voice.clone(),
            system_instruction: booking_instruction(&self.worker),
            tool_declarations: self.tools.declarations(),
        };

        let connect = self.connector.connect(&setup);
        let (transport, events) = match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(open)) => open,
            Ok(Err(e)) => {
                tracing::error!(session = %self.id, "session open failed: {}", e);
                self.capture.lock().stop();
                self.fail_connect(e.to_string());
                return Err(e);
            }
            Err(_) => {
                let ms = self.config.connect_timeout.as_millis() as u64;
                tracing::error!(session = %self.id, "session open timed out after {}ms", ms);
                self.capture.lock().stop();
                self.fail_connect(format!("connect timeout after {}ms", ms));
                return Err(LiveError::Timeout(ms));
            }
        };

        let transport: Arc<dyn LiveTransport> = Arc::from(transport);
        *self.transport.write() = Some(transport.clone());
        self.shared.set_state(SessionState::Active);
        tracing::info!(session = %self.id, worker = %self.worker.name, "live session active");

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(run_capture_pump(
            frame_rx,
            transport.clone(),
            self.config.input_sample_rate,
        )));
        tasks.push(tokio::spawn(run_event_loop(
            events,
            self.scheduler.clone(),
            self.tools.clone(),
            transport,
            self.shared.clone(),
        )));

        Ok(())
    }

    /// Close the session.
    ///
    /// Best-effort: the remote session, the microphone and all queued
    /// playback are released even if individual steps fail. Safe on a
    /// session that never reached `Active`, and idempotent.
    pub async fn close(&self) {
        let transport = self.transport.write().take();
        if let Some(transport) = transport {
            if let Err(e) = transport.close().await {
                tracing::debug!(session = %self.id, "transport close failed: {}", e);
            }
        }

        self.capture.lock().stop();
        self.scheduler.lock().interrupt();

        for task in self.tasks.lock().drain(..) {
            task.abort();
        }

        if self.shared.state() != SessionState::Closed {
            self.shared.set_state(SessionState::Closed);
            self.shared.emit(SessionEvent::Closed);
            tracing::info!(session = %self.id, "session closed");
        }
    }

    fn fail_connect(&self, reason: String) {
        self.shared.emit(SessionEvent::ConnectFailed { reason });
        self.shared.set_state(SessionState::Closed);
    }
}

impl Drop for VoiceBookingSession {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.capture.lock().stop();
        self.scheduler.lock().interrupt();
    }
}

/// Forward captured buffers to the agent as they arrive.
///
/// Each buffer is converted to 16-bit PCM, base64-encoded and sent
/// immediately at the hardware's cadence; a failed send is dropped
/// rather than retried, and never stalls capture.
async fn run_capture_pump(
    mut frames: mpsc::Receiver<Vec<f32>>,
    transport: Arc<dyn LiveTransport>,
    sample_rate: u32,
) {
    let mime_type = format!("audio/pcm;rate={}", sample_rate);
    let mut timestamp_ms = 0u64;
    while let Some(buffer) = frames.recv().await {
        let frame = AudioFrame::new(buffer, SampleRate::Hz16000, Channels::Mono, timestamp_ms);
        timestamp_ms += (frame.duration_secs() * 1000.0) as u64;
        let data = pcm::encode_pcm(&frame.samples);
        if let Err(e) = transport.send_audio(&mime_type, &data).await {
            tracing::debug!("outbound audio frame dropped: {}", e);
        }
    }
}

/// Consume inbound agent events strictly in arrival order.
///
/// This single task is the only mutator of the playback schedule during
/// normal operation, which serializes audio scheduling against
/// interruption by construction.
async fn run_event_loop(
    mut events: mpsc::Receiver<AgentEvent>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    tools: Arc<ToolRegistry>,
    transport: Arc<dyn LiveTransport>,
    shared: Arc<Shared>,
) {
    while let Some(event) = events.recv().await {
        match event {
            AgentEvent::Audio { pcm } => match pcm::i16_bytes_to_f32(&pcm) {
                Ok(samples) => {
                    if let Err(e) = scheduler.lock().schedule_chunk(&samples) {
                        tracing::warn!("failed to schedule agent audio: {}", e);
                    }
                }
                Err(e) => tracing::warn!("discarding malformed agent audio: {}", e),
            },
            AgentEvent::ToolCall { calls } => {
                for call in calls {
                    handle_tool_call(&tools, transport.as_ref(), &shared, call).await;
                }
            }
            AgentEvent::Interrupted => {
                tracing::debug!("barge-in: stopping queued playback");
                scheduler.lock().interrupt();
            }
            AgentEvent::Error { message } => {
                tracing::warn!("agent error (session continues): {}", message);
                shared.emit(SessionEvent::AgentError { message });
            }
            AgentEvent::Closed => {
                shared.set_state(SessionState::Closed);
                shared.emit(SessionEvent::Closed);
                break;
            }
        }
    }
}

/// Execute one tool call and acknowledge it immediately.
///
/// The acknowledgment unblocks the agent's turn-taking. A failed send is
/// logged but not retried; a lost acknowledgment can stall the agent's
/// turn, a known limitation of the fire-and-forget design.
async fn handle_tool_call(
    tools: &ToolRegistry,
    transport: &dyn LiveTransport,
    shared: &Shared,
    call: FunctionCall,
) {
    match tools.execute(&call.name, call.args.clone()).await {
        Ok(output) => {
            if call.name == ConfirmBookingTool::NAME {
                let date = call
                    .args
                    .get("date")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let time = call
                    .args
                    .get("time")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                shared.emit(SessionEvent::BookingConfirmed { date, time });
            }
            if let Err(e) = transport
                .send_tool_result(call.id.as_deref(), &call.name, output.response)
                .await
            {
                tracing::warn!(
                    "tool acknowledgment for '{}' failed (agent turn may stall): {}",
                    call.name,
                    e
                );
            }
        }
        Err(e) => {
            tracing::warn!("tool call '{}' rejected: {}", call.name, e);
        }
    }
}
