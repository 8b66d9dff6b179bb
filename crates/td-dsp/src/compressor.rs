//! Band compressor
//!
//! Log-domain gain computer fed with per-band stereo power. Two gain paths,
//! chosen when settings are applied:
//!
//! - **Main**: signed distance to threshold through an attack/release
//!   follower. Below threshold the gain expands upward by
//!   `release_time - 1`, above it the reduction is `distance · upward_ratio`.
//! - **Expander**: the envelope is knee-blended against a linear threshold
//!   recovered from the previous log level, then expanded below threshold or
//!   compressed by `1 - 1/ratio` above it.
//!
//! All gains stay within `[MIN_GAIN, MAX_BOOST]`, so finite input power never
//! produces NaN or Inf in state or output.

use serde::{Deserialize, Serialize};
use td_core::{Band, SampleRate, db};

use crate::{Processor, ProcessorConfig};

// ============ Constants ============

/// dB per neper (20 / ln 10)
pub const DB_PER_NEPER: f64 = 8.685_889_638_065_037;
/// Nepers per dB (ln 10 / 20); the time constant that turns dB into `exp` arguments
pub const NEPER_PER_DB: f64 = 0.115_129_254_649_702_28;
/// Bias for every logarithm
pub const LOG_EPSILON: f64 = db::LOG_EPSILON;
/// Gain floor (-40 dB)
pub const MIN_GAIN: f64 = 0.01;
/// Reduction and boost cap in dB
pub const MAX_RATIO: f64 = 36.0;
/// `exp` argument for the largest boost
const MAX_BOOST_NEPERS: f64 = MAX_RATIO * NEPER_PER_DB;
/// Ratio states at or below this select the main path
pub const PATH_SELECT_THRESHOLD: f64 = -0.008_300_781_25;
/// Added to band power so silence still has a finite level
pub const POWER_FLOOR: f64 = 1e-25;
/// Envelope outputs below this count as actively compressing
pub const ACTIVE_GAIN_THRESHOLD: f64 = 0.95;

const KNEE_COEFF: f64 = 0.5;
const LINEAR_COEFF: f64 = 1.0;

/// Clamp an `exp` argument and evaluate it as a bounded linear gain
#[inline(always)]
fn bounded_gain(exponent: f64) -> f64 {
    exponent.min(MAX_BOOST_NEPERS).exp().max(MIN_GAIN)
}

#[inline(always)]
fn to_db(level: f64) -> f64 {
    (level + LOG_EPSILON).ln() * DB_PER_NEPER
}

// ============ Settings ============

/// Per-band compressor configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    /// Threshold (dB)
    pub threshold_db: f64,
    /// Ratio state; also selects the gain path
    pub ratio: f64,
    /// Attack (ms)
    pub attack_ms: f64,
    /// Release (ms)
    pub release_ms: f64,
    /// dB of reduction per dB over threshold on the main path
    pub upward_ratio: f64,
    /// Below-threshold slope on the main path; 1.0 is unity gain
    pub release_time: f64,
}

impl CompressorSettings {
    /// Factory settings for a band
    pub fn for_band(band: Band) -> Self {
        match band {
            Band::Low => Self {
                threshold_db: -20.0,
                ratio: 2.0,
                attack_ms: 10.0,
                release_ms: 100.0,
                upward_ratio: 2.0,
                release_time: 1.0,
            },
            Band::Mid => Self {
                threshold_db: -15.0,
                ratio: 3.0,
                attack_ms: 8.0,
                release_ms: 80.0,
                upward_ratio: 2.5,
                release_time: 1.0,
            },
            Band::High => Self {
                threshold_db: -10.0,
                ratio: 4.0,
                attack_ms: 5.0,
                release_ms: 50.0,
                upward_ratio: 3.0,
                release_time: 1.0,
            },
        }
    }
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self::for_band(Band::Low)
    }
}

/// Gain computer variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressorPath {
    Main,
    Expander,
}

impl CompressorPath {
    pub fn select(ratio: f64) -> Self {
        if ratio <= PATH_SELECT_THRESHOLD {
            CompressorPath::Main
        } else {
            CompressorPath::Expander
        }
    }
}

/// Meter readout of one band
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandMeter {
    /// Last linear gain
    pub gain: f64,
    pub gain_reduction_db: f64,
    pub rms_db: f64,
    pub active: bool,
}

// ============ Compressor ============

/// Single-band dual-path compressor
#[derive(Debug, Clone)]
pub struct CompressorBand {
    settings: CompressorSettings,
    path: CompressorPath,
    sample_rate: SampleRate,
    time_scale: f64,

    // Coefficients
    rms_coeff: f64,
    attack_coeff: f64,
    release_coeff: f64,

    // State
    rms: f64,
    log_envelope: f64,
    gain_reduction: f64,
    envelope_output: f64,
}

impl CompressorBand {
    pub fn new(settings: CompressorSettings, sample_rate: f64) -> Self {
        let mut band = Self {
            settings,
            path: CompressorPath::select(settings.ratio),
            sample_rate: SampleRate::new(sample_rate).unwrap_or_default(),
            time_scale: 1.0,
            rms_coeff: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            rms: 0.0,
            log_envelope: 0.0,
            gain_reduction: 0.0,
            envelope_output: 1.0,
        };
        band.update_coefficients();
        band
    }

    /// Factory settings for `band`
    pub fn for_band(band: Band, sample_rate: f64) -> Self {
        Self::new(CompressorSettings::for_band(band), sample_rate)
    }

    /// Apply new settings; re-selects the path and recomputes timing
    pub fn configure(&mut self, settings: CompressorSettings) {
        self.settings = settings;
        self.path = CompressorPath::select(settings.ratio);
        self.update_coefficients();
    }

    /// Scale attack/release times (1.0 = as configured)
    pub fn set_time_scale(&mut self, scale: f64) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        if scale != self.time_scale {
            self.time_scale = scale;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        let attack_samples = self
            .sample_rate
            .ms_to_samples(self.settings.attack_ms * self.time_scale)
            .max(1.0);
        let release_samples = self
            .sample_rate
            .ms_to_samples(self.settings.release_ms * self.time_scale)
            .max(1.0);

        self.attack_coeff = (-1.0 / attack_samples).exp();
        self.release_coeff = (-1.0 / release_samples).exp();
        // Power window at half the attack time
        self.rms_coeff = (-2.0 / attack_samples).exp();
    }

    /// Advance one sample.
    ///
    /// `input_power` is the summed L²+R² of the band; returns
    /// `gain · output_level · band_gain`.
    #[inline]
    pub fn process(
        &mut self,
        input_power: f64,
        output_level: f64,
        band_gain: f64,
        time_constant: f64,
    ) -> f64 {
        let power = if input_power.is_nan() {
            0.0
        } else {
            input_power.clamp(0.0, f64::MAX)
        };

        self.rms = (self.rms - power) * self.rms_coeff + power;
        let envelope = self.rms.max(0.0).sqrt();

        let gain = match self.path {
            CompressorPath::Main => self.main_gain(envelope, time_constant),
            CompressorPath::Expander => self.expander_gain(envelope, time_constant),
        };
        self.envelope_output = gain;

        gain * output_level * band_gain
    }

    #[inline(always)]
    fn main_gain(&mut self, envelope: f64, time_constant: f64) -> f64 {
        let distance = (to_db(envelope) - self.settings.threshold_db).max(-MAX_RATIO);

        let coeff = if distance > self.gain_reduction {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        let smoothed = distance + (self.gain_reduction - distance) * coeff;
        self.gain_reduction = smoothed;

        if smoothed <= 0.0 {
            bounded_gain((self.settings.release_time - 1.0) * smoothed * time_constant)
        } else {
            let reduction = (smoothed * self.settings.upward_ratio).min(MAX_RATIO);
            bounded_gain(-reduction * time_constant)
        }
    }

    #[inline(always)]
    fn expander_gain(&mut self, envelope: f64, time_constant: f64) -> f64 {
        let linear_threshold = (self.log_envelope * time_constant).exp();
        let blend = if envelope <= linear_threshold {
            KNEE_COEFF
        } else {
            LINEAR_COEFF
        };
        let processed = linear_threshold + (envelope - linear_threshold) * blend;

        let level_db = to_db(processed);
        self.log_envelope = to_db(processed.max(LOG_EPSILON));

        let over = level_db - self.settings.threshold_db;
        if over <= 0.0 {
            bounded_gain((self.settings.release_time - 1.0) * over * time_constant)
        } else {
            let ratio = self.settings.ratio.max(1.0);
            let reduction = (over * (1.0 - 1.0 / ratio)).min(MAX_RATIO);
            bounded_gain(-reduction * time_constant)
        }
    }

    // ============ Accessors ============

    #[inline]
    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    #[inline]
    pub fn path(&self) -> CompressorPath {
        self.path
    }

    /// Last linear gain
    #[inline]
    pub fn envelope_output(&self) -> f64 {
        self.envelope_output
    }

    /// Smoothed power
    #[inline]
    pub fn rms(&self) -> f64 {
        self.rms
    }

    #[inline]
    pub fn log_envelope(&self) -> f64 {
        self.log_envelope
    }

    /// Follower state of the main path (dB over threshold)
    #[inline]
    pub fn gain_reduction(&self) -> f64 {
        self.gain_reduction
    }

    pub fn gain_reduction_db(&self) -> f64 {
        db::from_gain(self.envelope_output)
    }

    pub fn rms_db(&self) -> f64 {
        db::from_gain(self.rms.max(0.0).sqrt())
    }

    pub fn is_active(&self) -> bool {
        self.envelope_output < ACTIVE_GAIN_THRESHOLD
    }

    pub fn meter(&self) -> BandMeter {
        BandMeter {
            gain: self.envelope_output,
            gain_reduction_db: self.gain_reduction_db(),
            rms_db: self.rms_db(),
            active: self.is_active(),
        }
    }
}

impl Processor for CompressorBand {
    fn reset(&mut self) {
        self.rms = 0.0;
        self.log_envelope = 0.0;
        self.gain_reduction = 0.0;
        self.envelope_output = 1.0;
    }
}

impl ProcessorConfig for CompressorBand {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        match SampleRate::new(sample_rate) {
            Some(rate) => {
                self.sample_rate = rate;
                self.update_coefficients();
            }
            None => log::warn!("Compressor ignoring invalid sample rate {sample_rate}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: f64 = 44100.0;

    fn main_path_settings() -> CompressorSettings {
        CompressorSettings {
            ratio: -1.0,
            ..CompressorSettings::default()
        }
    }

    /// Feed constant power and return the settled gain
    fn settle(band: &mut CompressorBand, power: f64) -> f64 {
        for _ in 0..200_000 {
            band.process(power, 1.0, 1.0, NEPER_PER_DB);
        }
        band.envelope_output()
    }

    #[test]
    fn test_constants() {
        assert_relative_eq!(DB_PER_NEPER, 20.0 / std::f64::consts::LN_10, epsilon = 1e-12);
        assert_relative_eq!(NEPER_PER_DB * DB_PER_NEPER, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_path_selection() {
        assert_eq!(CompressorPath::select(2.0), CompressorPath::Expander);
        assert_eq!(CompressorPath::select(0.0), CompressorPath::Expander);
        assert_eq!(CompressorPath::select(-0.5), CompressorPath::Main);
        assert_eq!(
            CompressorPath::select(PATH_SELECT_THRESHOLD),
            CompressorPath::Main
        );

        let mut band = CompressorBand::for_band(Band::Mid, SR);
        assert_eq!(band.path(), CompressorPath::Expander);
        band.configure(main_path_settings());
        assert_eq!(band.path(), CompressorPath::Main);
    }

    #[test]
    fn test_main_path_monotonic_above_threshold() {
        let mut previous = f64::INFINITY;
        for amplitude in [0.15, 0.2, 0.3, 0.5, 0.8, 1.0, 2.0] {
            let mut band = CompressorBand::new(main_path_settings(), SR);
            let gain = settle(&mut band, amplitude * amplitude);
            assert!(gain <= previous, "gain rose at amplitude {amplitude}");
            assert!(gain >= MIN_GAIN);
            previous = gain;
        }
    }

    #[test]
    fn test_main_path_reduction_amount() {
        // 0.2 is ~6 dB over a -20 dB threshold; upward_ratio 2 doubles it
        let mut band = CompressorBand::new(main_path_settings(), SR);
        let gain = settle(&mut band, 0.04);
        let over = 20.0 * 0.2_f64.log10() + 20.0;
        assert_relative_eq!(gain, db::to_gain(-2.0 * over), epsilon = 1e-6);
    }

    #[test]
    fn test_main_path_unity_below_threshold() {
        let mut band = CompressorBand::new(main_path_settings(), SR);
        assert_eq!(settle(&mut band, 1e-6), 1.0);
        assert!(!band.is_active());
    }

    #[test]
    fn test_main_path_upward_boost() {
        let settings = CompressorSettings {
            release_time: 0.5,
            ..main_path_settings()
        };
        let mut band = CompressorBand::new(settings, SR);
        // -40 dB input, 20 dB under threshold, half of it restored
        let gain = settle(&mut band, 1e-4);
        assert_relative_eq!(gain, db::to_gain(10.0), epsilon = 1e-6);
    }

    #[test]
    fn test_expander_compresses_above_threshold() {
        let mut band = CompressorBand::for_band(Band::Low, SR);
        let gain = settle(&mut band, 0.25);
        let over = 20.0 * 0.5_f64.log10() + 20.0;
        assert_relative_eq!(gain, db::to_gain(-over * 0.5), epsilon = 1e-3);
        assert!(band.is_active());
    }

    #[test]
    fn test_expander_unity_below_threshold() {
        let mut band = CompressorBand::for_band(Band::High, SR);
        let gain = settle(&mut band, 1e-6);
        assert_relative_eq!(gain, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expander_steady_gain_does_not_toggle() {
        let mut band = CompressorBand::for_band(Band::Mid, SR);
        settle(&mut band, 0.09);
        let a = band.process(0.09, 1.0, 1.0, NEPER_PER_DB);
        let b = band.process(0.09, 1.0, 1.0, NEPER_PER_DB);
        assert_relative_eq!(a, b, epsilon = 1e-9);
    }

    #[test]
    fn test_output_scaling() {
        let mut band = CompressorBand::for_band(Band::Low, SR);
        settle(&mut band, 1e-8);
        let gain = band.envelope_output();
        let out = band.process(1e-8, 0.5, 2.0, NEPER_PER_DB);
        assert_relative_eq!(out, gain, epsilon = 1e-9);
    }

    #[test]
    fn test_finite_over_extreme_input() {
        for settings in [CompressorSettings::default(), main_path_settings()] {
            let mut band = CompressorBand::new(settings, SR);
            for power in [0.0, 1e-300, 1e-25, 1.0, 1e6, 1e300, f64::MAX, f64::INFINITY, f64::NAN] {
                for _ in 0..64 {
                    let out = band.process(power, 1.0, 1.0, NEPER_PER_DB);
                    assert!(out.is_finite(), "power {power} gave {out}");
                    assert!((MIN_GAIN..=db::to_gain(MAX_RATIO) + 1e-9).contains(&out));
                }
                assert!(band.rms().is_finite());
                assert!(band.log_envelope().is_finite());
                assert!(band.gain_reduction().is_finite());
            }
        }
    }

    #[test]
    fn test_time_scale_changes_attack() {
        let mut fast = CompressorBand::new(main_path_settings(), SR);
        let mut slow = CompressorBand::new(main_path_settings(), SR);
        fast.set_time_scale(0.1);
        slow.set_time_scale(1.9);
        for _ in 0..200 {
            fast.process(0.5, 1.0, 1.0, NEPER_PER_DB);
            slow.process(0.5, 1.0, 1.0, NEPER_PER_DB);
        }
        assert!(fast.envelope_output() < slow.envelope_output());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut band = CompressorBand::for_band(Band::High, SR);
        settle(&mut band, 0.5);
        let settings = *band.settings();
        band.reset();
        assert_eq!(band.rms(), 0.0);
        assert_eq!(band.log_envelope(), 0.0);
        assert_eq!(band.gain_reduction(), 0.0);
        assert_eq!(band.envelope_output(), 1.0);
        assert_eq!(*band.settings(), settings);
    }

    #[test]
    fn test_meter() {
        let mut band = CompressorBand::for_band(Band::Low, SR);
        let idle = band.meter();
        assert_eq!(idle.gain, 1.0);
        assert_relative_eq!(idle.gain_reduction_db, 0.0, epsilon = 1e-9);
        assert!(!idle.active);

        settle(&mut band, 0.25);
        let meter = band.meter();
        assert!(meter.gain_reduction_db < -1.0);
        assert_relative_eq!(meter.rms_db, 20.0 * 0.5_f64.log10(), epsilon = 1e-6);
        assert!(meter.active);
    }

    #[test]
    fn test_invalid_sample_rate_keeps_timing() {
        let mut band = CompressorBand::for_band(Band::Low, SR);
        let before = band.clone();
        band.set_sample_rate(0.0);
        band.process(0.1, 1.0, 1.0, NEPER_PER_DB);
        let mut reference = before;
        reference.process(0.1, 1.0, 1.0, NEPER_PER_DB);
        assert_eq!(band.envelope_output(), reference.envelope_output());
    }
}
