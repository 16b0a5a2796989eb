//! cpal-backed capture and playback devices
//!
//! cpal streams are not `Send`, so each device lives on a dedicated
//! thread that owns the stream for its whole life; the rest of the crate
//! talks to it through channels and shared mixer state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::capture::CaptureSource;
use crate::clock::OutputClock;
use crate::playback::{PlaybackHandle, PlaybackSink};
use crate::AudioError;

/// Microphone capture through the default cpal input device
pub struct CpalCapture {
    sample_rate: u32,
    chunk_size: usize,
    worker: Option<DeviceWorker>,
}

struct DeviceWorker {
    stop_tx: std_mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl DeviceWorker {
    fn shutdown(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.join();
    }
}

impl CpalCapture {
    /// Create a capture source producing `chunk_size`-sample buffers at `sample_rate`
    pub fn new(sample_rate: u32, chunk_size: usize) -> Self {
        Self {
            sample_rate,
            chunk_size,
            worker: None,
        }
    }
}

impl CaptureSource for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, frames: mpsc::Sender<Vec<f32>>) -> Result<(), AudioError> {
        if self.worker.is_some() {
            return Err(AudioError::CaptureRunning);
        }

        let sample_rate = self.sample_rate;
        let chunk_size = self.chunk_size;
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), AudioError>>();

        let join = std::thread::spawn(move || {
            let stream = match build_input_stream(sample_rate, chunk_size, frames) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::CaptureUnavailable(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            // Hold the stream until asked to stop.
            let _ = stop_rx.recv();
            drop(stream);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(DeviceWorker { stop_tx, join });
                tracing::info!(sample_rate, chunk_size, "microphone capture started");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(AudioError::CaptureUnavailable(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
            tracing::info!("microphone capture stopped");
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_input_stream(
    sample_rate: u32,
    chunk_size: usize,
    frames: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AudioError::CaptureUnavailable("no input device".to_string()))?;

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut pending: Vec<f32> = Vec::with_capacity(chunk_size);
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    pending.push(sample);
                    if pending.len() == chunk_size {
                        let chunk = std::mem::replace(&mut pending, Vec::with_capacity(chunk_size));
                        // Never block the device callback; a slow consumer loses frames.
                        if frames.try_send(chunk).is_err() {
                            tracing::trace!("capture frame dropped, consumer behind");
                        }
                    }
                }
            },
            |err| tracing::warn!("capture stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::CaptureUnavailable(e.to_string()))?;

    Ok(stream)
}

struct QueuedBuffer {
    samples: Arc<[f32]>,
    start_sample: u64,
    cancelled: Arc<AtomicBool>,
}

struct MixerState {
    queued: Vec<QueuedBuffer>,
    /// Samples written to the device since the stream started
    position: u64,
}

/// Speaker playback through the default cpal output device
///
/// Buffers are mixed sample-accurately at their scheduled start times;
/// the mixer's sample counter doubles as the playback clock.
pub struct CpalPlayback {
    sample_rate: u32,
    state: Arc<Mutex<MixerState>>,
    worker: Option<DeviceWorker>,
}

impl CpalPlayback {
    /// Open the default output device at `sample_rate` (mono)
    pub fn new(sample_rate: u32) -> Result<Self, AudioError> {
        let state = Arc::new(Mutex::new(MixerState {
            queued: Vec::new(),
            position: 0,
        }));

        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), AudioError>>();
        let mixer = state.clone();

        let join = std::thread::spawn(move || {
            let stream = match build_output_stream(sample_rate, mixer) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::PlaybackUnavailable(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            let _ = stop_rx.recv();
            drop(stream);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!(sample_rate, "playback device opened");
                Ok(Self {
                    sample_rate,
                    state,
                    worker: Some(DeviceWorker { stop_tx, join }),
                })
            }
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(AudioError::PlaybackUnavailable(
                    "playback thread exited during startup".to_string(),
                ))
            }
        }
    }

    /// Clock backed by the mixer's sample counter
    pub fn clock(&self) -> Arc<dyn OutputClock> {
        Arc::new(MixerClock {
            state: self.state.clone(),
            sample_rate: self.sample_rate,
        })
    }

    /// Release the output device
    pub fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
            tracing::info!("playback device closed");
        }
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        self.close();
    }
}

impl PlaybackSink for CpalPlayback {
    fn schedule(&self, samples: &[f32], at: f64) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock();
        let requested = (at * self.sample_rate as f64).round() as u64;
        let start_sample = requested.max(state.position);
        state.queued.push(QueuedBuffer {
            samples: samples.into(),
            start_sample,
            cancelled: cancelled.clone(),
        });
        Ok(Box::new(MixerHandle { cancelled }))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

struct MixerHandle {
    cancelled: Arc<AtomicBool>,
}

impl PlaybackHandle for MixerHandle {
    fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

struct MixerClock {
    state: Arc<Mutex<MixerState>>,
    sample_rate: u32,
}

impl OutputClock for MixerClock {
    fn now(&self) -> f64 {
        self.state.lock().position as f64 / self.sample_rate as f64
    }
}

fn build_output_stream(
    sample_rate: u32,
    mixer: Arc<Mutex<MixerState>>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::PlaybackUnavailable("no output device".to_string()))?;

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut state = mixer.lock();
                let base = state.position;
                for (i, out) in data.iter_mut().enumerate() {
                    let idx = base + i as u64;
                    let mut acc = 0.0f32;
                    for buffer in &state.queued {
                        if buffer.cancelled.load(Ordering::Relaxed) || idx < buffer.start_sample {
                            continue;
                        }
                        let offset = (idx - buffer.start_sample) as usize;
                        if offset < buffer.samples.len() {
                            acc += buffer.samples[offset];
                        }
                    }
                    *out = acc.clamp(-1.0, 1.0);
                }
                state.position = base + data.len() as u64;
                let position = state.position;
                state
                    .queued
                    .retain(|b| {
                        !b.cancelled.load(Ordering::Relaxed)
                            && b.start_sample + b.samples.len() as u64 > position
                    });
            },
            |err| tracing::warn!("playback stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::PlaybackUnavailable(e.to_string()))?;

    Ok(stream)
}
