//! One-pole parameter smoothing
//!
//! Advanced once per sample toward a target supplied by the caller. The
//! coefficient is fixed at construction; reset returns to the initial value.

use td_core::Sample;

use crate::Processor;

/// Depth smoother: starts at 0, coefficient 0.01
pub const DEPTH_SMOOTHING: (f64, f64) = (0.0, 0.01);
/// Input drive (upward ratio) smoother: starts at 0, coefficient 0.01
pub const DRIVE_SMOOTHING: (f64, f64) = (0.0, 0.01);
/// Output level smoother: starts at unity, coefficient 0.005
pub const OUTPUT_SMOOTHING: (f64, f64) = (1.0, 0.005);

/// Exponentially smoothed value
#[derive(Debug, Clone)]
pub struct SmoothedParameter {
    value: f64,
    initial: f64,
    coeff: f64,
}

impl SmoothedParameter {
    /// `coeff` is the per-sample step fraction, clamped to `(0, 1]`
    pub fn new(initial: f64, coeff: f64) -> Self {
        let coeff = if coeff.is_finite() && coeff > 0.0 {
            coeff.min(1.0)
        } else {
            1.0
        };
        Self {
            value: initial,
            initial,
            coeff,
        }
    }

    /// Construct from an `(initial, coeff)` pair
    pub fn from_preset((initial, coeff): (f64, f64)) -> Self {
        Self::new(initial, coeff)
    }

    /// Step toward `target` and return the new value
    #[inline(always)]
    pub fn next(&mut self, target: Sample) -> Sample {
        self.value += (target - self.value) * self.coeff;
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    /// Jump straight to a value without smoothing
    pub fn set_immediate(&mut self, value: f64) {
        self.value = value;
    }
}

impl Processor for SmoothedParameter {
    fn reset(&mut self) {
        self.value = self.initial;
    }
}
