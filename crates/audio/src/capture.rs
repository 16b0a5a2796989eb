//! Microphone capture contract
//!
//! Capture sources deliver fixed-size f32 buffers at their declared rate
//! into a channel as soon as the hardware produces them. Acquiring the
//! device happens in `start`; a failure there is fatal to session startup
//! and the session never attempts a remote connection after it.

use tokio::sync::mpsc;

use crate::AudioError;

/// A push-style source of microphone audio
pub trait CaptureSource: Send {
    /// Declared capture sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Acquire the device and start delivering buffers into `frames`.
    ///
    /// Buffers are produced at the hardware's natural cadence (buffer
    /// size divided by sample rate) with no batching. If the receiver
    /// falls behind, sources may drop buffers rather than block the
    /// device callback.
    fn start(&mut self, frames: mpsc::Sender<Vec<f32>>) -> Result<(), AudioError>;

    /// Release the device. Idempotent; safe to call before `start`.
    fn stop(&mut self);
}
