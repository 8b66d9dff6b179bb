//! Three-band stereo crossover
//!
//! Six cells, two per channel per stage:
//! - Stage A: raw input at the mid/high point; its lowpass feeds stage B
//! - Stage B: low/mid point; lowpass is the low band, highpass the mid band
//! - Stage C: raw input at the mid/high point; highpass is the high band
//!
//! Stages A and C see the same signal at the same cutoff, so the high band is
//! the complement of stage A's lowpass. The bands sum to the input only
//! approximately, with shallow dips around the two crossover points.
//!
//! The usual wiring puts stages A and C at the low/mid point and stage B at
//! mid/high. That leaves the mid band empty, so the points are swapped here.

use serde::{Deserialize, Serialize};
use td_core::{Sample, StereoSample};

use crate::biquad::BiquadStage;
use crate::{Processor, ProcessorConfig};

/// Default low/mid crossover (Hz)
pub const DEFAULT_LOW_MID_HZ: f64 = 200.0;
/// Default mid/high crossover (Hz)
pub const DEFAULT_MID_HIGH_HZ: f64 = 2000.0;

const STAGE_A: usize = 0;
const STAGE_B: usize = 2;
const STAGE_C: usize = 4;

/// Number of filter cells in the network
pub const STAGE_COUNT: usize = 6;

/// Crossover frequencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverPoints {
    pub low_mid: f64,
    pub mid_high: f64,
}

impl Default for CrossoverPoints {
    fn default() -> Self {
        Self {
            low_mid: DEFAULT_LOW_MID_HZ,
            mid_high: DEFAULT_MID_HIGH_HZ,
        }
    }
}

/// One channel split into bands
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelBands {
    pub low: Sample,
    pub mid: Sample,
    pub high: Sample,
}

impl ChannelBands {
    #[inline]
    pub fn sum(&self) -> Sample {
        self.low + self.mid + self.high
    }
}

/// Stereo three-band crossover network
#[derive(Debug, Clone)]
pub struct CrossoverNetwork {
    stages: [BiquadStage; STAGE_COUNT],
    points: CrossoverPoints,
    sample_rate: f64,
}

impl Default for CrossoverNetwork {
    /// Unconfigured network: everything passes through the high band
    fn default() -> Self {
        Self {
            stages: Default::default(),
            points: CrossoverPoints::default(),
            sample_rate: 0.0,
        }
    }
}

impl CrossoverNetwork {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_points(sample_rate, CrossoverPoints::default())
    }

    pub fn with_points(sample_rate: f64, points: CrossoverPoints) -> Self {
        let mut network = Self {
            points,
            sample_rate,
            ..Self::default()
        };
        network.configure();
        network
    }

    pub fn points(&self) -> CrossoverPoints {
        self.points
    }

    pub fn set_points(&mut self, points: CrossoverPoints) {
        self.points = points;
        self.configure();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Filter cell by index (`stage * 2 + channel`)
    pub fn stage(&self, index: usize) -> Option<&BiquadStage> {
        self.stages.get(index)
    }

    /// True when every cell has bypass coefficients
    pub fn is_bypassed(&self) -> bool {
        self.stages.iter().all(|stage| stage.coeffs().is_bypass())
    }

    fn configure(&mut self) {
        let sr = self.sample_rate;
        let CrossoverPoints { low_mid, mid_high } = self.points;
        for channel in 0..2 {
            self.stages[STAGE_A + channel].set_cutoff(mid_high, sr);
            self.stages[STAGE_B + channel].set_cutoff(low_mid, sr);
            self.stages[STAGE_C + channel].set_cutoff(mid_high, sr);
        }
    }

    #[inline(always)]
    fn split_channel(&mut self, channel: usize, input: Sample) -> ChannelBands {
        let upper = self.stages[STAGE_A + channel].process(input);
        let lower = self.stages[STAGE_B + channel].process(upper.lowpass);
        let high = self.stages[STAGE_C + channel].process(input);
        ChannelBands {
            low: lower.lowpass,
            mid: lower.highpass,
            high: high.highpass,
        }
    }

    /// Full three-band split of one stereo frame
    #[inline]
    pub fn split(&mut self, input: StereoSample) -> (ChannelBands, ChannelBands) {
        (
            self.split_channel(0, input.left),
            self.split_channel(1, input.right),
        )
    }

    /// Low/high split of one stereo frame; the mid band reads as silence
    #[inline]
    pub fn split_low_high(&mut self, input: StereoSample) -> (ChannelBands, ChannelBands) {
        let (mut left, mut right) = self.split(input);
        left.mid = 0.0;
        right.mid = 0.0;
        (left, right)
    }
}

impl Processor for CrossoverNetwork {
    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

impl ProcessorConfig for CrossoverNetwork {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.configure();
    }
}
