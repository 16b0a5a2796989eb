//! Playback scheduling
//!
//! Inbound agent audio arrives as separate network chunks but must sound
//! like one continuous utterance. The scheduler places each chunk at
//! `max(next_start_time, clock.now())` and advances `next_start_time` by
//! the chunk's duration, so consecutive chunks butt up against each other
//! exactly. A barge-in stops every live buffer and resets the schedule
//! baseline to zero, which makes the next chunk play immediately.
//!
//! `next_start_time` and the active-handle set are private to this type;
//! the session's inbound event loop is the only mutator during normal
//! operation, with the shutdown path as the only other caller.

use std::sync::Arc;

use crate::clock::OutputClock;
use crate::AudioError;

/// A single scheduled playback buffer
pub trait PlaybackHandle: Send {
    /// Stop this buffer immediately, silencing any remaining samples
    fn stop(&self);
}

/// A sink that plays f32 mono buffers at scheduled times
pub trait PlaybackSink: Send + Sync {
    /// Schedule `samples` to start playing at `at` seconds on the sink's clock
    fn schedule(&self, samples: &[f32], at: f64) -> Result<Box<dyn PlaybackHandle>, AudioError>;

    /// Sample rate the sink plays at
    fn sample_rate(&self) -> u32;
}

struct ScheduledBuffer {
    handle: Box<dyn PlaybackHandle>,
    end_time: f64,
}

/// Gapless scheduler for inbound agent audio
pub struct PlaybackScheduler {
    clock: Arc<dyn OutputClock>,
    sink: Arc<dyn PlaybackSink>,
    next_start_time: f64,
    active: Vec<ScheduledBuffer>,
}

impl PlaybackScheduler {
    pub fn new(clock: Arc<dyn OutputClock>, sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            clock,
            sink,
            next_start_time: 0.0,
            active: Vec::new(),
        }
    }

    /// Schedule a chunk to play seamlessly after everything already queued.
    ///
    /// Returns the start time chosen for the chunk.
    pub fn schedule_chunk(&mut self, samples: &[f32]) -> Result<f64, AudioError> {
        if samples.is_empty() {
            return Ok(self.next_start_time);
        }

        let now = self.clock.now();
        let start = self.next_start_time.max(now);
        let duration = samples.len() as f64 / self.sink.sample_rate() as f64;

        let handle = self.sink.schedule(samples, start)?;
        self.next_start_time = start + duration;

        // Buffers that have finished playing no longer need a handle.
        self.active.retain(|b| b.end_time > now);
        self.active.push(ScheduledBuffer {
            handle,
            end_time: start + duration,
        });

        Ok(start)
    }

    /// Barge-in: stop every live buffer and reset the schedule baseline
    /// so the next chunk plays as soon as it arrives.
    pub fn interrupt(&mut self) {
        for buffer in self.active.drain(..) {
            buffer.handle.stop();
        }
        self.next_start_time = 0.0;
    }

    /// Time at which the next chunk would start if it arrived now
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    /// Number of buffers currently tracked as live
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ManualClock(Mutex<f64>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(0.0)))
        }

        fn advance(&self, secs: f64) {
            *self.0.lock() += secs;
        }
    }

    impl OutputClock for ManualClock {
        fn now(&self) -> f64 {
            *self.0.lock()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        starts: Mutex<Vec<f64>>,
        stopped: Arc<AtomicUsize>,
    }

    struct RecordingHandle {
        stopped: Arc<AtomicUsize>,
    }

    impl PlaybackHandle for RecordingHandle {
        fn stop(&self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl PlaybackSink for RecordingSink {
        fn schedule(&self, _samples: &[f32], at: f64) -> Result<Box<dyn PlaybackHandle>, AudioError> {
            self.starts.lock().push(at);
            Ok(Box::new(RecordingHandle {
                stopped: self.stopped.clone(),
            }))
        }

        fn sample_rate(&self) -> u32 {
            24_000
        }
    }

    fn half_second() -> Vec<f32> {
        vec![0.0; 12_000]
    }

    #[test]
    fn test_chunks_schedule_back_to_back() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = PlaybackScheduler::new(clock.clone(), sink.clone());

        let first = scheduler.schedule_chunk(&half_second()).unwrap();
        let second = scheduler.schedule_chunk(&half_second()).unwrap();
        let third = scheduler.schedule_chunk(&half_second()).unwrap();

        assert_eq!(first, 0.0);
        assert!((second - 0.5).abs() < 1e-9);
        assert!((third - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_never_precedes_clock() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = PlaybackScheduler::new(clock.clone(), sink.clone());

        scheduler.schedule_chunk(&half_second()).unwrap();

        // A late chunk (clock has moved past the queued end) starts at "now".
        clock.advance(2.0);
        let start = scheduler.schedule_chunk(&half_second()).unwrap();
        assert!((start - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_interrupt_stops_and_resets() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = PlaybackScheduler::new(clock.clone(), sink.clone());

        scheduler.schedule_chunk(&half_second()).unwrap();
        scheduler.schedule_chunk(&half_second()).unwrap();
        scheduler.schedule_chunk(&half_second()).unwrap();
        assert_eq!(scheduler.active_count(), 3);

        clock.advance(0.25);
        scheduler.interrupt();
        assert_eq!(sink.stopped.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(scheduler.next_start_time(), 0.0);

        // Next chunk schedules at the current clock, not the stale queue end.
        let start = scheduler.schedule_chunk(&half_second()).unwrap();
        assert!((start - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_finished_buffers_are_pruned() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = PlaybackScheduler::new(clock.clone(), sink.clone());

        scheduler.schedule_chunk(&half_second()).unwrap();
        clock.advance(1.0);
        scheduler.schedule_chunk(&half_second()).unwrap();
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_empty_chunk_is_a_no_op() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = PlaybackScheduler::new(clock, sink.clone());

        scheduler.schedule_chunk(&[]).unwrap();
        assert!(sink.starts.lock().is_empty());
        assert_eq!(scheduler.active_count(), 0);
    }
}
