//! Tools for the live voice booking agent
//!
//! The remote conversational agent is handed a set of declared tools at
//! session setup and calls them with schema-validated arguments during
//! the conversation. This crate provides the declaration/validation
//! layer plus the one domain tool the booking flow needs:
//! `confirmBooking`.

pub mod booking;
pub mod registry;
pub mod schema;

pub use booking::{BookingSink, ConfirmBookingTool};
pub use registry::ToolRegistry;
pub use schema::{
    ErrorCode, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema,
};

impl From<ToolError> for thekedaar_voice_core::Error {
    fn from(err: ToolError) -> Self {
        thekedaar_voice_core::Error::Tool(err.to_string())
    }
}
