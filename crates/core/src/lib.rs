//! Core types for the Thekedaar live voice booking assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Audio frame types and PCM conversions
//! - Error types
//! - Booking domain types (workers, time slots, confirmations)

pub mod audio;
pub mod booking;
pub mod error;
pub mod pcm;

pub use audio::{AudioFrame, Channels, SampleRate};
pub use booking::{BookingConfirmation, TimeSlot, Worker};
pub use error::{Error, Result};
