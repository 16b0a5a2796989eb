//! Transport seams for the live session
//!
//! The conversational agent is reached through a connector that resolves
//! once the remote session is open, yielding a transport handle for
//! outbound traffic and a channel of inbound events in arrival order.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::event::AgentEvent;
use crate::LiveError;

/// Configuration handed to the remote agent when opening a session
#[derive(Debug, Clone)]
pub struct SessionSetup {
    /// Model identifier
    pub model: String,
    /// Synthesized voice identity
    pub voice: String,
    /// System instruction text
    pub system_instruction: String,
    /// Tool declarations in the wire shape of the setup message
    pub tool_declarations: Value,
}

/// Outbound half of an open live session
#[async_trait]
pub trait LiveTransport: Send + Sync {
    /// Send one captured audio chunk (base64 16-bit PCM with its MIME type)
    async fn send_audio(&self, mime_type: &str, data: &str) -> Result<(), LiveError>;

    /// Acknowledge a tool call so the agent's turn-taking continues
    async fn send_tool_result(
        &self,
        id: Option<&str>,
        name: &str,
        response: Value,
    ) -> Result<(), LiveError>;

    /// Close the remote session
    async fn close(&self) -> Result<(), LiveError>;
}

/// Factory opening live sessions against the remote agent
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a session.
    ///
    /// Resolves once the remote side has accepted the setup; inbound
    /// events arrive on the returned channel in arrival order, ending
    /// with [`AgentEvent::Closed`].
    async fn connect(
        &self,
        setup: &SessionSetup,
    ) -> Result<(Box<dyn LiveTransport>, mpsc::Receiver<AgentEvent>), LiveError>;
}
