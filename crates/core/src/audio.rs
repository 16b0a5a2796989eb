//! Audio frame types
//!
//! The live session runs two fixed-rate audio paths: microphone capture
//! at 16 kHz and agent playback at 24 kHz, both mono. The two paths use
//! independent clocks and are never assumed to be synchronized.

use serde::{Deserialize, Serialize};

/// Sample rates used by the live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRate {
    /// Microphone capture rate
    Hz16000,
    /// Agent playback rate
    Hz24000,
}

impl SampleRate {
    /// Rate in Hz
    pub fn as_u32(&self) -> u32 {
        match self {
            SampleRate::Hz16000 => 16_000,
            SampleRate::Hz24000 => 24_000,
        }
    }
}

/// Channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Number of channels
    pub fn count(&self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// A chunk of PCM audio samples
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Samples in [-1.0, 1.0], interleaved if stereo
    pub samples: Vec<f32>,
    /// Sample rate
    pub sample_rate: SampleRate,
    /// Channel layout
    pub channels: Channels,
    /// Capture timestamp in milliseconds from stream start
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Create a new audio frame
    pub fn new(
        samples: Vec<f32>,
        sample_rate: SampleRate,
        channels: Channels,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            timestamp_ms,
        }
    }

    /// Frame duration in seconds
    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() / self.channels.count();
        frames as f64 / self.sample_rate.as_u32() as f64
    }

    /// Check whether the frame carries any samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rates() {
        assert_eq!(SampleRate::Hz16000.as_u32(), 16_000);
        assert_eq!(SampleRate::Hz24000.as_u32(), 24_000);
    }

    #[test]
    fn test_frame_duration() {
        let frame = AudioFrame::new(vec![0.0; 12_000], SampleRate::Hz24000, Channels::Mono, 0);
        assert!((frame.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stereo_duration_counts_frames() {
        let frame = AudioFrame::new(vec![0.0; 32_000], SampleRate::Hz16000, Channels::Stereo, 0);
        assert!((frame.duration_secs() - 1.0).abs() < 1e-9);
    }
}
