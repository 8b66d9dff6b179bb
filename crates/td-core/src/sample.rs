//! Sample types

use serde::{Deserialize, Serialize};

/// Audio sample type, f64 throughout the processing path
pub type Sample = f64;

/// Stereo sample pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    pub const SILENCE: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    #[inline]
    pub const fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Summed instantaneous power of both channels (L² + R²)
    #[inline]
    pub fn power(self) -> Sample {
        self.left * self.left + self.right * self.right
    }

    #[inline]
    pub fn scale(self, gain: Sample) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

/// Sample rate helper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRate(f64);

impl SampleRate {
    pub const DEFAULT: Self = Self(44100.0);

    /// Accepts only finite, positive rates
    pub fn new(hz: f64) -> Option<Self> {
        (hz.is_finite() && hz > 0.0).then_some(Self(hz))
    }

    #[inline]
    pub fn hz(self) -> f64 {
        self.0
    }

    /// Convert milliseconds to samples at this rate
    #[inline]
    pub fn ms_to_samples(self, ms: f64) -> f64 {
        ms * 0.001 * self.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}
