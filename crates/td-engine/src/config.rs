//! Engine configuration
//!
//! [`EngineConfig`] is the construction-time setup (serialisable).
//! [`RuntimeParams`] is what the audio thread derives from the twenty host
//! parameters at each block boundary.

use std::path::Path;

use serde::{Deserialize, Serialize};
use td_core::{Band, ParameterId, ParameterSet, TdResult};
use td_dsp::{CompressorSettings, CrossoverPoints};

/// Default command queue capacity
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Shortest time scale (Time = 0)
pub const TIME_SCALE_MIN: f64 = 0.1;
/// Time scale span; Time = 0.5 gives 1.0, Time = 1 gives 1.9
pub const TIME_SCALE_RANGE: f64 = 1.8;

/// Engine setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub crossover: CrossoverPoints,
    /// Compressor settings indexed by [`Band::index`]
    pub bands: [CompressorSettings; 3],
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: td_core::SampleRate::DEFAULT.hz(),
            crossover: CrossoverPoints::default(),
            bands: Band::ALL.map(CompressorSettings::for_band),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> TdResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> TdResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> TdResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Map the Time parameter to an attack/release multiplier
#[inline]
pub fn time_scale(time: f64) -> f64 {
    TIME_SCALE_MIN + TIME_SCALE_RANGE * time
}

/// Values the audio thread works with, derived from a [`ParameterSet`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeParams {
    pub bypass: bool,
    pub advanced: bool,
    pub depth: f64,
    /// Input drive; the mapped upward ratio
    pub drive: f64,
    /// Mapped downward ratio; reported only, the gain path does not use it
    pub downward_ratio: f64,
    /// Doubled band gains (0.5 → unity)
    pub band_gains: [f64; 3],
    pub time_scale: f64,
}

impl RuntimeParams {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            bypass: params.bypass(),
            advanced: params.advanced_mode(),
            depth: params.get(ParameterId::Depth),
            drive: params.upward_ratio(),
            downward_ratio: params.downward_ratio(),
            band_gains: Band::ALL.map(|band| params.band_gain(band)),
            time_scale: time_scale(params.get(ParameterId::Time)),
        }
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::from_parameters(&ParameterSet::default())
    }
}
