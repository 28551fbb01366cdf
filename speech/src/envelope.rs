use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rodio::Source;

/// Shared RMS of the window of samples most recently pulled by the audio
/// sink. Written by the playback thread, read at frame cadence by lip-sync.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    rms_bits: Arc<AtomicU32>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rms(&self) -> f32 {
        f32::from_bits(self.rms_bits.load(Ordering::Relaxed))
    }

    fn store(&self, rms: f32) {
        self.rms_bits.store(rms.to_bits(), Ordering::Relaxed);
    }
}

const WINDOW_SAMPLES: usize = 1024;

/// Pass-through source that measures the windowed RMS of everything the sink
/// consumes.
pub struct EnvelopeTap<S> {
    inner: S,
    envelope: Envelope,
    acc: f32,
    count: usize,
}

impl<S> EnvelopeTap<S> {
    pub fn new(inner: S, envelope: Envelope) -> Self {
        Self {
            inner,
            envelope,
            acc: 0.0,
            count: 0,
        }
    }
}

impl<S> Iterator for EnvelopeTap<S>
where
    S: Source,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self.inner.next() {
            Some(sample) => {
                self.acc += sample * sample;
                self.count += 1;
                if self.count >= WINDOW_SAMPLES {
                    self.envelope.store((self.acc / self.count as f32).sqrt());
                    self.acc = 0.0;
                    self.count = 0;
                }
                Some(sample)
            }
            None => {
                // the clip ended, the mouth must not stay open
                self.envelope.store(0.0);
                None
            }
        }
    }
}

impl<S> Source for EnvelopeTap<S>
where
    S: Source,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}
