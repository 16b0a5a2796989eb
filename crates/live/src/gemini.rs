//! Gemini Live transport
//!
//! Connects to the BidiGenerateContent WebSocket endpoint, performs the
//! setup/setupComplete handshake, then streams captured audio up and
//! translates server messages into [`AgentEvent`]s in arrival order.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use thekedaar_voice_core::pcm;

use crate::event::{AgentEvent, FunctionCall};
use crate::traits::{LiveConnector, LiveTransport, SessionSetup};
use crate::LiveError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

const EVENT_QUEUE: usize = 64;

/// Connector for Google's Gemini Live API
pub struct GeminiLiveConnector {
    endpoint: String,
    api_key: String,
}

impl GeminiLiveConnector {
    /// Production BidiGenerateContent endpoint
    pub const DEFAULT_ENDPOINT: &'static str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Override the WebSocket endpoint (testing, regional routing)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(
        &self,
        setup: &SessionSetup,
    ) -> Result<(Box<dyn LiveTransport>, mpsc::Receiver<AgentEvent>), LiveError> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        tracing::debug!(model = %setup.model, "websocket connected, sending setup");

        let (mut writer, mut reader) = stream.split();

        writer
            .send(Message::Text(setup_message(setup).to_string()))
            .await
            .map_err(|e| LiveError::Connect(format!("setup send failed: {}", e)))?;

        await_setup_complete(&mut reader).await?;
        tracing::debug!("setup complete, session open");

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        tokio::spawn(run_read_loop(reader, event_tx));

        let transport = GeminiLiveTransport {
            writer: tokio::sync::Mutex::new(writer),
        };
        Ok((Box::new(transport), event_rx))
    }
}

/// Wait for the server to acknowledge the setup message
async fn await_setup_complete(reader: &mut WsReader) -> Result<(), LiveError> {
    loop {
        match reader.next().await {
            Some(Ok(Message::Close(_))) | None => {
                return Err(LiveError::Connect(
                    "connection closed during setup".to_string(),
                ));
            }
            Some(Ok(message)) => {
                let Some(text) = message_text(&message) else {
                    continue;
                };
                if let Ok(value) = serde_json::from_str::<Value>(&text) {
                    if value.get("setupComplete").is_some() {
                        return Ok(());
                    }
                    if let Some(error) = value.get("error") {
                        return Err(LiveError::Connect(format!("setup rejected: {}", error)));
                    }
                }
            }
            Some(Err(e)) => return Err(LiveError::Connect(e.to_string())),
        }
    }
}

/// Translate server frames into agent events until the socket ends.
///
/// Exactly one `Closed` event terminates the stream, whatever ended it.
async fn run_read_loop(mut reader: WsReader, events: mpsc::Sender<AgentEvent>) {
    while let Some(item) = reader.next().await {
        match item {
            Ok(Message::Close(_)) => break,
            Ok(message) => {
                let Some(text) = message_text(&message) else {
                    continue;
                };
                for event in parse_server_message(&text) {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = events
                    .send(AgentEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                break;
            }
        }
    }
    let _ = events.send(AgentEvent::Closed).await;
}

/// Extract the JSON text of a frame; the server sends both text and
/// binary frames carrying UTF-8 JSON.
fn message_text(message: &Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text.clone()),
        Message::Binary(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Render the session setup message
fn setup_message(setup: &SessionSetup) -> Value {
    json!({
        "setup": {
            "model": format!("models/{}", setup.model),
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": setup.voice } }
                },
            },
            "systemInstruction": { "parts": [ { "text": setup.system_instruction } ] },
            "tools": [ { "functionDeclarations": setup.tool_declarations } ],
        }
    })
}

/// Translate one server message into zero or more agent events.
///
/// Tool calls come first, then audio parts in order, then interruption,
/// matching the order the session must observe them in.
fn parse_server_message(text: &str) -> Vec<AgentEvent> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return vec![AgentEvent::Error {
            message: format!("unparseable server message ({} bytes)", text.len()),
        }];
    };

    let mut events = Vec::new();

    if let Some(raw_calls) = value
        .pointer("/toolCall/functionCalls")
        .and_then(Value::as_array)
    {
        let calls: Vec<FunctionCall> = raw_calls
            .iter()
            .map(|call| FunctionCall {
                id: call.get("id").and_then(Value::as_str).map(String::from),
                name: call
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                args: call.get("args").cloned().unwrap_or(Value::Null),
            })
            .collect();
        if !calls.is_empty() {
            events.push(AgentEvent::ToolCall { calls });
        }
    }

    if let Some(parts) = value
        .pointer("/serverContent/modelTurn/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            if let Some(data) = part.pointer("/inlineData/data").and_then(Value::as_str) {
                match pcm::decode_base64(data) {
                    Ok(bytes) => events.push(AgentEvent::Audio { pcm: bytes }),
                    Err(e) => events.push(AgentEvent::Error {
                        message: format!("bad audio payload: {}", e),
                    }),
                }
            }
        }
    }

    if value
        .pointer("/serverContent/interrupted")
        .and_then(Value::as_bool)
        == Some(true)
    {
        events.push(AgentEvent::Interrupted);
    }

    events
}

struct GeminiLiveTransport {
    writer: tokio::sync::Mutex<WsWriter>,
}

impl GeminiLiveTransport {
    async fn send(&self, value: Value) -> Result<(), LiveError> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Text(value.to_string()))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))
    }
}

#[async_trait]
impl LiveTransport for GeminiLiveTransport {
    async fn send_audio(&self, mime_type: &str, data: &str) -> Result<(), LiveError> {
        self.send(json!({
            "realtimeInput": {
                "mediaChunks": [ { "mimeType": mime_type, "data": data } ]
            }
        }))
        .await
    }

    async fn send_tool_result(
        &self,
        id: Option<&str>,
        name: &str,
        response: Value,
    ) -> Result<(), LiveError> {
        let mut function_response = json!({ "name": name, "response": response });
        if let Some(id) = id {
            function_response["id"] = json!(id);
        }
        self.send(json!({
            "toolResponse": { "functionResponses": [ function_response ] }
        }))
        .await
    }

    async fn close(&self) -> Result<(), LiveError> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Close(None))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_message_shape() {
        let setup = SessionSetup {
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Puck".to_string(),
            system_instruction: "Help the user book a plumber.".to_string(),
            tool_declarations: json!([{ "name": "confirmBooking" }]),
        };

        let message = setup_message(&setup);
        assert_eq!(
            message["setup"]["model"],
            "models/gemini-2.5-flash-native-audio-preview-09-2025"
        );
        assert_eq!(
            message["setup"]["generationConfig"]["responseModalities"][0],
            "AUDIO"
        );
        assert_eq!(
            message["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]
                ["prebuiltVoiceConfig"]["voiceName"],
            "Puck"
        );
        assert_eq!(
            message["setup"]["tools"][0]["functionDeclarations"][0]["name"],
            "confirmBooking"
        );
    }

    #[test]
    fn test_parse_audio_part() {
        let data = pcm::encode_pcm(&[0.25, -0.25]);
        let message = json!({
            "serverContent": {
                "modelTurn": { "parts": [ { "inlineData": { "data": data, "mimeType": "audio/pcm;rate=24000" } } ] }
            }
        });

        let events = parse_server_message(&message.to_string());
        assert_eq!(events.len(), 1);
        let AgentEvent::Audio { pcm: bytes } = &events[0] else {
            panic!("expected audio event");
        };
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn test_parse_tool_call() {
        let message = json!({
            "toolCall": {
                "functionCalls": [
                    { "id": "call-1", "name": "confirmBooking",
                      "args": { "date": "2024-06-01", "time": "11:00 AM - 01:00 PM" } }
                ]
            }
        });

        let events = parse_server_message(&message.to_string());
        assert_eq!(events.len(), 1);
        let AgentEvent::ToolCall { calls } = &events[0] else {
            panic!("expected tool call event");
        };
        assert_eq!(calls[0].id.as_deref(), Some("call-1"));
        assert_eq!(calls[0].name, "confirmBooking");
        assert_eq!(calls[0].args["date"], "2024-06-01");
    }

    #[test]
    fn test_parse_interruption() {
        let message = json!({ "serverContent": { "interrupted": true } });
        let events = parse_server_message(&message.to_string());
        assert_eq!(events, vec![AgentEvent::Interrupted]);
    }

    #[test]
    fn test_parse_combined_message_orders_tool_calls_first() {
        let data = pcm::encode_pcm(&[0.0; 4]);
        let message = json!({
            "toolCall": { "functionCalls": [ { "name": "confirmBooking", "args": {} } ] },
            "serverContent": {
                "modelTurn": { "parts": [ { "inlineData": { "data": data } } ] },
                "interrupted": true
            }
        });

        let events = parse_server_message(&message.to_string());
        assert!(matches!(events[0], AgentEvent::ToolCall { .. }));
        assert!(matches!(events[1], AgentEvent::Audio { .. }));
        assert_eq!(events[2], AgentEvent::Interrupted);
    }

    #[test]
    fn test_parse_garbage_yields_error_event() {
        let events = parse_server_message("not json");
        assert!(matches!(events[0], AgentEvent::Error { .. }));
    }

    #[test]
    fn test_parse_unrelated_message_yields_nothing() {
        let events = parse_server_message(r#"{"usageMetadata": {"totalTokenCount": 7}}"#);
        assert!(events.is_empty());
    }
}
