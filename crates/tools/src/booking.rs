//! The confirmBooking tool
//!
//! The agent is instructed to call `confirmBooking` only once the user
//! has explicitly agreed on both a date and a time slot. Each accepted
//! call notifies the host application exactly once through the booking
//! sink; the caller acknowledges the call back to the agent so its
//! turn-taking continues.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use thekedaar_voice_core::{BookingConfirmation, TimeSlot};

use crate::schema::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

/// Host callback invoked once per accepted booking confirmation.
///
/// May fire multiple times across a session if the user rebooks.
pub trait BookingSink: Send + Sync {
    fn on_booking_confirmed(&self, date: &str, time: &str);
}

impl<F> BookingSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn on_booking_confirmed(&self, date: &str, time: &str) {
        self(date, time)
    }
}

/// Tool the agent calls to finalize a booking
pub struct ConfirmBookingTool {
    sink: Arc<dyn BookingSink>,
}

impl ConfirmBookingTool {
    /// The name the agent invokes this tool by
    pub const NAME: &'static str = "confirmBooking";

    pub fn new(sink: Arc<dyn BookingSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for ConfirmBookingTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Confirm the booking once the user has agreed on a date and a time slot"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "date",
                    PropertySchema::string("The date in YYYY-MM-DD format"),
                    true,
                )
                .property(
                    "time",
                    PropertySchema::enum_type("The time slot chosen", TimeSlot::labels()),
                    true,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let date = input
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_params("'date' must be a string"))?;
        let time = input
            .get("time")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_params("'time' must be a string"))?;

        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            ToolError::invalid_params(format!("'date' is not a YYYY-MM-DD date: {}", date))
        })?;

        if TimeSlot::parse(time).is_none() {
            return Err(ToolError::invalid_params(format!(
                "'time' is not a bookable slot: {}",
                time
            )));
        }

        let confirmation = BookingConfirmation::new(date, time);
        tracing::info!(date = %confirmation.date, time = %confirmation.time, "booking confirmed");
        self.sink
            .on_booking_confirmed(&confirmation.date, &confirmation.time);

        Ok(ToolOutput::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn tool_with_recorder() -> (ConfirmBookingTool, Arc<Mutex<Vec<(String, String)>>>) {
        let confirmed: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = confirmed.clone();
        let sink = move |date: &str, time: &str| {
            recorder.lock().push((date.to_string(), time.to_string()));
        };
        (ConfirmBookingTool::new(Arc::new(sink)), confirmed)
    }

    #[tokio::test]
    async fn test_valid_booking_invokes_sink_once() {
        let (tool, confirmed) = tool_with_recorder();
        let input = json!({ "date": "2024-06-01", "time": "11:00 AM - 01:00 PM" });

        tool.validate(&input).unwrap();
        let output = tool.execute(input).await.unwrap();

        assert!(!output.is_error);
        assert_eq!(output.response["result"], "ok");
        let calls = confirmed.lock();
        assert_eq!(
            calls.as_slice(),
            &[("2024-06-01".to_string(), "11:00 AM - 01:00 PM".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_date_is_rejected() {
        let (tool, confirmed) = tool_with_recorder();
        let input = json!({ "date": "June 1st", "time": "11:00 AM - 01:00 PM" });

        assert!(tool.execute(input).await.is_err());
        assert!(confirmed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_slot_is_rejected() {
        let (tool, confirmed) = tool_with_recorder();
        let input = json!({ "date": "2024-06-01", "time": "10:00 PM - 11:00 PM" });

        assert!(tool.execute(input).await.is_err());
        assert!(confirmed.lock().is_empty());
    }

    #[test]
    fn test_schema_requires_both_fields() {
        let (tool, _) = tool_with_recorder();
        let schema = tool.schema();
        assert_eq!(schema.input_schema.required.len(), 2);
        assert!(tool
            .validate(&json!({ "date": "2024-06-01" }))
            .is_err());
    }
}
