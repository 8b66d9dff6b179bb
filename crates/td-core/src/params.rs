//! Parameter model
//!
//! Twenty normalised host parameters (0.0-1.0). Values are stored raw and
//! clamped; derived quantities (ratios, doubled gains, switch states) are
//! computed on read so that `get(set(v)) == clamp01(v)` always holds.

use serde::{Deserialize, Serialize};

/// Number of host-visible parameters
pub const PARAM_COUNT: usize = 20;

/// Clamp a host value into the normalised range. NaN maps to 0.0.
#[inline]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Map a normalised ratio control to a compression ratio.
///
/// Piecewise linear: `[0, 0.5] -> [0, 1]`, `(0.5, 1] -> (1, 9]`.
#[inline]
pub fn ratio_from_normalized(value: f64) -> f64 {
    if value > 0.5 {
        (value - 0.5) * 16.0 + 1.0
    } else {
        value * 2.0
    }
}

/// Inverse of [`ratio_from_normalized`], clamped to the normalised range
#[inline]
pub fn normalized_from_ratio(ratio: f64) -> f64 {
    let value = if ratio > 1.0 {
        (ratio - 1.0) / 16.0 + 0.5
    } else {
        ratio * 0.5
    };
    clamp01(value)
}

// ============ Bands ============

/// Frequency band of the three-way split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Low, Band::Mid, Band::High];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Mid => "Mid",
            Band::High => "High",
        }
    }

    /// Per-band gain parameter
    pub fn gain_param(self) -> ParameterId {
        match self {
            Band::Low => ParameterId::LowGain,
            Band::Mid => ParameterId::MidGain,
            Band::High => ParameterId::HighGain,
        }
    }
}

// ============ Parameter IDs ============

/// Host parameter identifier; the discriminant is the host index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum ParameterId {
    Depth = 0,
    Time,
    UpwardRatio,
    DownwardRatio,
    AdvancedMode,
    LowBand,
    MidBand,
    HighBand,
    LowGain,
    MidGain,
    HighGain,
    Switch1,
    Switch2,
    Switch3,
    Switch4,
    Switch5,
    Switch6,
    Control1,
    Control2,
    Bypass,
}

impl ParameterId {
    pub const ALL: [ParameterId; PARAM_COUNT] = [
        ParameterId::Depth,
        ParameterId::Time,
        ParameterId::UpwardRatio,
        ParameterId::DownwardRatio,
        ParameterId::AdvancedMode,
        ParameterId::LowBand,
        ParameterId::MidBand,
        ParameterId::HighBand,
        ParameterId::LowGain,
        ParameterId::MidGain,
        ParameterId::HighGain,
        ParameterId::Switch1,
        ParameterId::Switch2,
        ParameterId::Switch3,
        ParameterId::Switch4,
        ParameterId::Switch5,
        ParameterId::Switch6,
        ParameterId::Control1,
        ParameterId::Control2,
        ParameterId::Bypass,
    ];

    /// Look up a host index; `None` when out of range
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn info(self) -> &'static ParamInfo {
        &PARAM_INFO[self.index()]
    }

    /// Human-readable value, e.g. `"9.0:1"`, `"On"`, `"50.0%"`
    pub fn format_value(self, value: f64) -> String {
        let info = self.info();
        let value = clamp01(value);
        if info.is_boolean {
            // Any nonzero value switches on, matching `ParameterSet::is_on`
            String::from(if value != 0.0 { "On" } else { "Off" })
        } else if info.ratio_scaled {
            let ratio = ratio_from_normalized(value);
            if ratio >= 1.0 {
                format!("{ratio:.1}:1")
            } else {
                format!("{ratio:.2}")
            }
        } else {
            format!("{:.1}{}", value * 100.0, info.unit)
        }
    }
}

/// Static parameter metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    pub name: &'static str,
    pub unit: &'static str,
    pub default: f64,
    pub is_boolean: bool,
    /// Mapped through [`ratio_from_normalized`] for display and processing
    pub ratio_scaled: bool,
}

const fn continuous(name: &'static str, unit: &'static str) -> ParamInfo {
    ParamInfo {
        name,
        unit,
        default: 0.5,
        is_boolean: false,
        ratio_scaled: false,
    }
}

const fn ratio(name: &'static str) -> ParamInfo {
    ParamInfo {
        name,
        unit: ":1",
        default: 0.5,
        is_boolean: false,
        ratio_scaled: true,
    }
}

const fn switch(name: &'static str) -> ParamInfo {
    ParamInfo {
        name,
        unit: "",
        default: 0.0,
        is_boolean: true,
        ratio_scaled: false,
    }
}

static PARAM_INFO: [ParamInfo; PARAM_COUNT] = [
    continuous("Depth", "%"),
    continuous("Time", "ms"),
    ratio("Upward Ratio"),
    ratio("Downward Ratio"),
    switch("Advanced Mode"),
    continuous("Low Band", "dB"),
    continuous("Mid Band", "dB"),
    continuous("High Band", "dB"),
    continuous("Low Gain", "dB"),
    continuous("Mid Gain", "dB"),
    continuous("High Gain", "dB"),
    switch("Switch 1"),
    switch("Switch 2"),
    switch("Switch 3"),
    switch("Switch 4"),
    switch("Switch 5"),
    switch("Switch 6"),
    continuous("Control 1", ""),
    continuous("Control 2", ""),
    switch("Bypass"),
];

// ============ Parameter Set ============

/// Full set of the twenty raw parameter values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: [f64; PARAM_COUNT],
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut values = [0.0; PARAM_COUNT];
        for (value, info) in values.iter_mut().zip(PARAM_INFO.iter()) {
            *value = info.default;
        }
        Self { values }
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw values; each is clamped
    pub fn from_values(values: [f64; PARAM_COUNT]) -> Self {
        Self {
            values: values.map(clamp01),
        }
    }

    #[inline]
    pub fn get(&self, id: ParameterId) -> f64 {
        self.values[id.index()]
    }

    /// Store a clamped value and return what was stored
    #[inline]
    pub fn set(&mut self, id: ParameterId, value: f64) -> f64 {
        let clamped = clamp01(value);
        self.values[id.index()] = clamped;
        clamped
    }

    /// Index-based read; out-of-range indices read as 0.0
    pub fn get_index(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn values(&self) -> &[f64; PARAM_COUNT] {
        &self.values
    }

    /// Boolean view: any non-zero value is on
    #[inline]
    pub fn is_on(&self, id: ParameterId) -> bool {
        self.get(id) != 0.0
    }

    pub fn bypass(&self) -> bool {
        self.is_on(ParameterId::Bypass)
    }

    pub fn advanced_mode(&self) -> bool {
        self.is_on(ParameterId::AdvancedMode)
    }

    pub fn upward_ratio(&self) -> f64 {
        ratio_from_normalized(self.get(ParameterId::UpwardRatio))
    }

    pub fn downward_ratio(&self) -> f64 {
        ratio_from_normalized(self.get(ParameterId::DownwardRatio))
    }

    /// Linear band gain; the raw value is doubled so 0.5 is unity
    pub fn band_gain(&self, band: Band) -> f64 {
        self.get(band.gain_param()) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ratio_mapping() {
        assert_eq!(ratio_from_normalized(0.0), 0.0);
        assert_eq!(ratio_from_normalized(0.25), 0.5);
        assert_eq!(ratio_from_normalized(0.5), 1.0);
        assert_eq!(ratio_from_normalized(0.75), 5.0);
        assert_eq!(ratio_from_normalized(1.0), 9.0);
    }

    #[test]
    fn test_ratio_inverse() {
        for &v in &[0.0, 0.1, 0.3, 0.5, 0.6, 0.8, 1.0] {
            let ratio = ratio_from_normalized(v);
            assert_relative_eq!(normalized_from_ratio(ratio), v, epsilon = 1e-12);
        }
        assert_eq!(normalized_from_ratio(100.0), 1.0);
        assert_eq!(normalized_from_ratio(-1.0), 0.0);
    }

    #[test]
    fn test_defaults() {
        let set = ParameterSet::default();
        assert_eq!(set.get(ParameterId::Depth), 0.5);
        assert_eq!(set.get(ParameterId::Control2), 0.5);
        assert_eq!(set.get(ParameterId::AdvancedMode), 0.0);
        assert_eq!(set.get(ParameterId::Switch4), 0.0);
        assert_eq!(set.get(ParameterId::Bypass), 0.0);
        assert!(!set.bypass());
        assert!(!set.advanced_mode());
        assert_eq!(set.upward_ratio(), 1.0);
        for band in Band::ALL {
            assert_eq!(set.band_gain(band), 1.0);
        }
    }

    #[test]
    fn test_set_clamps() {
        let mut set = ParameterSet::default();
        for id in ParameterId::ALL {
            for &v in &[-3.0, -0.0, 0.25, 0.999, 1.0, 7.5] {
                let stored = set.set(id, v);
                assert_eq!(stored, clamp01(v));
                assert_eq!(set.get(id), clamp01(v));
            }
        }
        assert_eq!(set.set(ParameterId::Depth, f64::NAN), 0.0);
        assert_eq!(set.set(ParameterId::Depth, f64::INFINITY), 1.0);
    }

    #[test]
    fn test_index_lookup() {
        for (i, id) in ParameterId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ParameterId::from_index(i), Some(*id));
        }
        assert_eq!(ParameterId::from_index(PARAM_COUNT), None);
        assert_eq!(ParameterSet::default().get_index(999), 0.0);
    }

    #[test]
    fn test_boolean_view() {
        let mut set = ParameterSet::default();
        set.set(ParameterId::AdvancedMode, 0.01);
        assert!(set.advanced_mode());
        set.set(ParameterId::AdvancedMode, 0.0);
        assert!(!set.advanced_mode());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(ParameterId::UpwardRatio.format_value(1.0), "9.0:1");
        assert_eq!(ParameterId::UpwardRatio.format_value(0.25), "0.50");
        assert_eq!(ParameterId::Bypass.format_value(1.0), "On");
        assert_eq!(ParameterId::AdvancedMode.format_value(0.2), "On");
        assert_eq!(ParameterId::AdvancedMode.format_value(0.0), "Off");
        assert_eq!(ParameterId::Switch4.format_value(-1.0), "Off");
        assert_eq!(ParameterId::Depth.format_value(0.5), "50.0%");
        assert_eq!(ParameterId::LowGain.info().name, "Low Gain");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut set = ParameterSet::default();
        set.set(ParameterId::Time, 0.8);
        let json = serde_json::to_string(&set).unwrap();
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
