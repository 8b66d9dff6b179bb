//! td-dsp: DSP building blocks for Trident
//!
//! Everything here is allocation-free once constructed and safe to call from
//! the audio thread.
//!
//! ## Modules
//!
//! - `biquad`: trapezoidal two-state crossover cell (lowpass + highpass taps)
//! - `crossover`: six-cell stereo three-band split
//! - `compressor`: dual-path log-domain band compressor
//! - `smoothing`: one-pole parameter smoothing
//! - `metering`: linear-decay peak envelope follower
//! - `ring_buffer`: band alignment buffer between the split and compression passes

pub mod biquad;
pub mod compressor;
pub mod crossover;
pub mod metering;
pub mod ring_buffer;
pub mod smoothing;

pub use biquad::{BandSplit, BiquadCoeffs, BiquadStage};
pub use compressor::{BandMeter, CompressorBand, CompressorPath, CompressorSettings};
pub use crossover::{ChannelBands, CrossoverNetwork, CrossoverPoints};
pub use metering::PeakEnvelopeFollower;
pub use ring_buffer::BandAlignmentBuffer;
pub use smoothing::SmoothedParameter;

/// Common processor trait
pub trait Processor: Send + Sync {
    /// Reset processor state; coefficients and settings are kept
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Processor configuration
pub trait ProcessorConfig {
    fn set_sample_rate(&mut self, sample_rate: f64);
}
