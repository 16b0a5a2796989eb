//! PCM sample conversions and transport encoding
//!
//! The live agent exchanges raw 16-bit little-endian PCM, base64-encoded
//! inside JSON messages. Capture produces f32 samples; playback consumes
//! f32 samples; these helpers convert at the transport boundary.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::AudioError;

/// Convert f32 samples in [-1.0, 1.0] to 16-bit little-endian PCM bytes
pub fn f32_to_i16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Convert 16-bit little-endian PCM bytes to f32 samples
pub fn i16_bytes_to_f32(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::InvalidFormat(format!(
            "PCM payload has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

/// Encode f32 samples as base64 16-bit PCM for transmission
pub fn encode_pcm(samples: &[f32]) -> String {
    STANDARD.encode(f32_to_i16_bytes(samples))
}

/// Decode a base64 16-bit PCM payload into f32 samples
pub fn decode_pcm(data: &str) -> Result<Vec<f32>, AudioError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| AudioError::Encoding(e.to_string()))?;
    i16_bytes_to_f32(&bytes)
}

/// Decode a base64 payload into raw bytes
pub fn decode_base64(data: &str) -> Result<Vec<u8>, AudioError> {
    STANDARD
        .decode(data)
        .map_err(|e| AudioError::Encoding(e.to_string()))
}
