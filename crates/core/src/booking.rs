//! Booking domain types
//!
//! The assistant books a service partner (worker) into one of a fixed
//! menu of time slots. Slot labels are canonical strings shared with the
//! rest of the marketplace; the agent must confirm one of them verbatim.

use serde::{Deserialize, Serialize};

/// A bookable service partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Display name, e.g. "Ramesh Kumar"
    pub name: String,
    /// Profession, e.g. "Plumber"
    pub profession: String,
}

impl Worker {
    pub fn new(name: impl Into<String>, profession: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profession: profession.into(),
        }
    }
}

/// The fixed menu of bookable time slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl TimeSlot {
    /// All slots in display order
    pub fn all() -> [TimeSlot; 4] {
        [
            TimeSlot::Morning,
            TimeSlot::Midday,
            TimeSlot::Afternoon,
            TimeSlot::Evening,
        ]
    }

    /// Canonical label used across the marketplace
    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "09:00 AM - 11:00 AM",
            TimeSlot::Midday => "11:00 AM - 01:00 PM",
            TimeSlot::Afternoon => "02:00 PM - 04:00 PM",
            TimeSlot::Evening => "04:00 PM - 06:00 PM",
        }
    }

    /// Short spoken form used in the agent's instructions
    pub fn spoken(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "9am-11am",
            TimeSlot::Midday => "11am-1pm",
            TimeSlot::Afternoon => "2pm-4pm",
            TimeSlot::Evening => "4pm-6pm",
        }
    }

    /// Parse a canonical label back into a slot
    pub fn parse(label: &str) -> Option<TimeSlot> {
        TimeSlot::all().into_iter().find(|s| s.label() == label)
    }

    /// Canonical labels in display order
    pub fn labels() -> Vec<String> {
        TimeSlot::all().iter().map(|s| s.label().to_string()).collect()
    }
}

/// A confirmed booking, as agreed in conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    /// ISO date, YYYY-MM-DD
    pub date: String,
    /// One of the canonical slot labels
    pub time: String,
}

impl BookingConfirmation {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_labels_are_canonical() {
        assert_eq!(TimeSlot::Midday.label(), "11:00 AM - 01:00 PM");
        assert_eq!(TimeSlot::all().len(), 4);
    }

    #[test]
    fn test_slot_parse_roundtrip() {
        for slot in TimeSlot::all() {
            assert_eq!(TimeSlot::parse(slot.label()), Some(slot));
        }
        assert_eq!(TimeSlot::parse("10:00 AM - 12:00 PM"), None);
    }

    #[test]
    fn test_worker() {
        let worker = Worker::new("Ramesh Kumar", "Plumber");
        assert_eq!(worker.profession, "Plumber");
    }
}
