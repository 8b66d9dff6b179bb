//! td-core: Core types for Trident
//!
//! Shared by the DSP and engine crates:
//! - Sample types
//! - Host parameter model and ratio mapping
//! - Preset bank
//! - Error types

mod error;
mod params;
mod preset;
mod sample;

pub use error::*;
pub use params::*;
pub use preset::*;
pub use sample::*;

/// Decibel helpers
pub mod db {
    /// Floor added before taking logarithms
    pub const LOG_EPSILON: f64 = 1e-30;

    /// Linear gain to dB, finite for zero input
    #[inline]
    pub fn from_gain(gain: f64) -> f64 {
        20.0 * (gain + LOG_EPSILON).log10()
    }

    #[inline]
    pub fn to_gain(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }
}
