//! Inbound agent events
//!
//! Everything the remote agent sends is reduced to this tagged union and
//! consumed in arrival order by the session's event loop.

use serde_json::Value;

/// A structured function-invocation request from the agent
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Call id, echoed back in the tool response when present
    pub id: Option<String>,
    /// Tool name
    pub name: String,
    /// Tool arguments
    pub args: Value,
}

/// One inbound event from the remote agent
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Synthesized speech: 16-bit little-endian PCM at 24 kHz mono
    Audio { pcm: Vec<u8> },
    /// Tool calls, each requiring an acknowledgment
    ToolCall { calls: Vec<FunctionCall> },
    /// The user started speaking over queued playback (barge-in)
    Interrupted,
    /// Non-fatal agent-side error; the session continues
    Error { message: String },
    /// The agent closed the session
    Closed,
}
