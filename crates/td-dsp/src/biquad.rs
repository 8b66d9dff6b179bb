//! Crossover filter cell
//!
//! Two-state trapezoidal-integrated filter (state-variable topology). One call
//! yields both a lowpass and a complementary highpass tap computed from the
//! same pre-update state, which is what the crossover network consumes.

use std::f64::consts::{PI, SQRT_2};

use td_core::Sample;

use crate::{Processor, ProcessorConfig};

/// Butterworth damping (Q = 1/√2)
pub const BUTTERWORTH_DAMPING: f64 = SQRT_2;

/// Upper cutoff bound as a fraction of the sample rate; keeps `tan` finite
const MAX_CUTOFF_RATIO: f64 = 0.49;

/// Filter cell coefficients
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    /// Damping term
    pub k: f64,
}

impl BiquadCoeffs {
    /// Butterworth crossover cell at `freq`
    pub fn crossover(freq: f64, sample_rate: f64) -> Self {
        Self::with_damping(freq, sample_rate, BUTTERWORTH_DAMPING)
    }

    /// Cell with explicit damping; invalid input yields [`Self::bypass`]
    pub fn with_damping(freq: f64, sample_rate: f64, k: f64) -> Self {
        let valid = sample_rate.is_finite()
            && sample_rate > 0.0
            && freq.is_finite()
            && freq > 0.0
            && k.is_finite();
        if !valid {
            return Self::bypass();
        }

        let freq = freq.min(sample_rate * MAX_CUTOFF_RATIO);
        let g = (PI * freq / sample_rate).tan();
        let a1 = 1.0 / ((k + g) * g + 1.0);
        let a2 = a1 * g;

        Self {
            a1,
            a2,
            a3: a2 * g,
            k,
        }
    }

    /// All-zero coefficients: lowpass reads 0, highpass equals the input
    pub const fn bypass() -> Self {
        Self {
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            k: 0.0,
        }
    }

    pub fn is_bypass(&self) -> bool {
        *self == Self::bypass()
    }
}

/// Both taps of one filter step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandSplit {
    pub lowpass: Sample,
    pub highpass: Sample,
}

/// Single crossover cell with cached coefficients
#[derive(Debug, Clone)]
pub struct BiquadStage {
    coeffs: BiquadCoeffs,
    state1: f64,
    state2: f64,
    cutoff: f64,
    sample_rate: f64,
}

impl Default for BiquadStage {
    fn default() -> Self {
        Self::new()
    }
}

impl BiquadStage {
    /// Unconfigured stage (bypass coefficients)
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoeffs::bypass(),
            state1: 0.0,
            state2: 0.0,
            cutoff: 0.0,
            sample_rate: 0.0,
        }
    }

    pub fn with_cutoff(freq: f64, sample_rate: f64) -> Self {
        let mut stage = Self::new();
        stage.set_cutoff(freq, sample_rate);
        stage
    }

    /// Recompute coefficients when the cutoff or rate actually changes
    pub fn set_cutoff(&mut self, freq: f64, sample_rate: f64) {
        if freq == self.cutoff && sample_rate == self.sample_rate {
            return;
        }
        self.cutoff = freq;
        self.sample_rate = sample_rate;
        self.coeffs = BiquadCoeffs::crossover(freq, sample_rate);
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Integrator states
    #[inline]
    pub fn state(&self) -> (f64, f64) {
        (self.state1, self.state2)
    }

    /// Advance one sample
    #[inline(always)]
    pub fn process(&mut self, input: Sample) -> BandSplit {
        let BiquadCoeffs { a1, a2, a3, k } = self.coeffs;

        let processed = input - self.state2;
        let intermediate = self.state1 * a1 + processed * a2;
        let lowpass = self.state1 * a2 + self.state2 + processed * a3;

        self.state1 = 2.0 * intermediate - self.state1;
        self.state2 = 2.0 * lowpass - self.state2;

        BandSplit {
            lowpass,
            highpass: input - intermediate * k - lowpass,
        }
    }
}

impl Processor for BiquadStage {
    fn reset(&mut self) {
        self.state1 = 0.0;
        self.state2 = 0.0;
    }
}

impl ProcessorConfig for BiquadStage {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.set_cutoff(self.cutoff, sample_rate);
    }
}
