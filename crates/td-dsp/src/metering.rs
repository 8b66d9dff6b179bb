//! Peak envelope follower
//!
//! Instant attack, linear per-sample decay floored at zero. Compares the signed
//! sample, so only positive excursions raise the envelope. Metering only.

use td_core::Sample;

use crate::Processor;

/// Linear decay per sample
pub const PEAK_DECAY_PER_SAMPLE: f64 = 2.5e-5;

#[derive(Debug, Clone)]
pub struct PeakEnvelopeFollower {
    envelope: f64,
    decay: f64,
}

impl Default for PeakEnvelopeFollower {
    fn default() -> Self {
        Self::new(PEAK_DECAY_PER_SAMPLE)
    }
}

impl PeakEnvelopeFollower {
    pub fn new(decay: f64) -> Self {
        Self {
            envelope: 0.0,
            decay: decay.max(0.0),
        }
    }

    #[inline(always)]
    pub fn process(&mut self, sample: Sample) -> f64 {
        if sample >= self.envelope {
            self.envelope = sample;
        } else {
            self.envelope = (self.envelope - self.decay).max(0.0);
        }
        self.envelope
    }

    /// Run over a block and return the final envelope
    pub fn process_block(&mut self, block: &[Sample]) -> f64 {
        for &sample in block {
            self.process(sample);
        }
        self.envelope
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.envelope
    }
}

impl Processor for PeakEnvelopeFollower {
    fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
