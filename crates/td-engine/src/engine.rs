//! Audio-thread engine
//!
//! Each block runs in two passes over the band alignment buffer:
//!
//! 1. Split: smooth depth and drive, split the driven input into bands
//!    (low/high in simple mode, three shaped bands in advanced mode), scale
//!    by the depth factor and write one frame per sample.
//! 2. Compress: rewind to the start of the block, run each band through its
//!    compressor with the summed stereo power and mix into the outputs.
//!
//! Blocks longer than the buffer are processed in buffer-sized chunks.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rtrb::{Consumer, RingBuffer};
use td_core::{Band, ParameterId, ParameterSet, Sample, SampleRate, StereoSample};
use td_dsp::compressor::{NEPER_PER_DB, POWER_FLOOR};
use td_dsp::ring_buffer::{ALIGNMENT_BUFFER_SIZE, LANE_COUNT};
use td_dsp::smoothing::{DEPTH_SMOOTHING, DRIVE_SMOOTHING, OUTPUT_SMOOTHING};
use td_dsp::{
    BandAlignmentBuffer, ChannelBands, CompressorBand, CompressorSettings, CrossoverNetwork,
    CrossoverPoints, PeakEnvelopeFollower, Processor, ProcessorConfig, SmoothedParameter,
};

use crate::config::{EngineConfig, RuntimeParams};
use crate::controller::EngineController;
use crate::shared::SharedState;

/// Per-band scale applied to depth before the split is written
pub const COMPRESSION_SCALING: f64 = 0.52;
/// Drive multiplier for the high band shaping gain (advanced mode)
pub const HIGH_SHAPING: f64 = 2.273_046_97;
/// Drive multiplier for the mid band shaping gain (advanced mode)
pub const MID_SHAPING: f64 = 0.927_524_984;
/// Target of the output level smoother
pub const OUTPUT_LEVEL_TARGET: f64 = 1.0;

/// Structural changes sent from the control side
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Reset,
    SetSampleRate(f64),
    SetCrossover(CrossoverPoints),
    ConfigureBand(Band, CompressorSettings),
}

/// Real-time processor; owns every piece of DSP state
pub struct Engine {
    shared: Arc<SharedState>,
    command_rx: Consumer<ControlCommand>,
    applied_generation: u64,
    runtime: RuntimeParams,
    sample_rate: f64,

    crossover: CrossoverNetwork,
    compressors: [CompressorBand; 3],
    alignment: BandAlignmentBuffer,

    depth: SmoothedParameter,
    drive: SmoothedParameter,
    output: SmoothedParameter,
    peaks: [PeakEnvelopeFollower; 2],
}

impl Engine {
    /// Build an engine and its control handle
    pub fn new(config: EngineConfig) -> (Self, EngineController) {
        let params = ParameterSet::default();
        let shared = Arc::new(SharedState::new(&params));
        let (command_tx, command_rx) = RingBuffer::new(config.command_capacity.max(1));
        let runtime = RuntimeParams::from_parameters(&params);

        let compressors = Band::ALL.map(|band| {
            let mut compressor = CompressorBand::new(config.bands[band.index()], config.sample_rate);
            compressor.set_time_scale(runtime.time_scale);
            compressor
        });

        if SampleRate::new(config.sample_rate).is_none() {
            log::warn!(
                "Invalid sample rate {}; crossover runs as pass-through",
                config.sample_rate
            );
        }

        let engine = Self {
            applied_generation: shared.params.generation(),
            shared: Arc::clone(&shared),
            command_rx,
            runtime,
            sample_rate: config.sample_rate,
            crossover: CrossoverNetwork::with_points(config.sample_rate, config.crossover),
            compressors,
            alignment: BandAlignmentBuffer::new(),
            depth: SmoothedParameter::from_preset(DEPTH_SMOOTHING),
            drive: SmoothedParameter::from_preset(DRIVE_SMOOTHING),
            output: SmoothedParameter::from_preset(OUTPUT_SMOOTHING),
            peaks: Default::default(),
        };

        log::debug!(
            "Engine created at {} Hz, crossover {:?}",
            config.sample_rate,
            config.crossover
        );

        (engine, EngineController::new(shared, command_tx))
    }

    // ============ Control (not for use while processing) ============

    /// Stage a parameter; ignored for out-of-range indices
    pub fn set_parameter(&self, index: usize, value: f64) {
        if let Some(id) = ParameterId::from_index(index) {
            self.shared.params.store(id, value);
        }
    }

    /// Last raw value set; 0.0 for out-of-range indices
    pub fn get_parameter(&self, index: usize) -> f64 {
        ParameterId::from_index(index)
            .map(|id| self.shared.params.load(id))
            .unwrap_or(0.0)
    }

    /// Change the sample rate immediately.
    ///
    /// An invalid rate leaves the crossover as pass-through and keeps the
    /// compressor timing.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if SampleRate::new(sample_rate).is_none() {
            log::warn!("Invalid sample rate {sample_rate}; crossover runs as pass-through");
        } else {
            log::debug!("Sample rate set to {sample_rate} Hz");
        }
        self.apply_sample_rate(sample_rate);
    }

    /// Clear all signal state; coefficients, settings and parameters are kept
    pub fn reset(&mut self) {
        self.reset_state();
        log::debug!("Engine reset");
    }

    // ============ Audio thread ============

    /// Process one block.
    ///
    /// A missing second input or output channel aliases the first. Missing
    /// buffers or a zero count leave the outputs untouched.
    pub fn process(
        &mut self,
        inputs: &[&[Sample]],
        outputs: &mut [&mut [Sample]],
        sample_count: usize,
    ) {
        let Some(&left_in) = inputs.first() else {
            return;
        };
        let right_in = inputs.get(1).copied().unwrap_or(left_in);
        let Some((out_left, rest)) = outputs.split_first_mut() else {
            return;
        };
        let mut out_right = rest.first_mut().map(|out| &mut **out);

        let len = [
            sample_count,
            left_in.len(),
            right_in.len(),
            out_left.len(),
            out_right.as_ref().map_or(usize::MAX, |out| out.len()),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);
        if len == 0 {
            return;
        }

        self.begin_block();

        if self.runtime.bypass {
            match out_right.as_deref_mut() {
                Some(right) => {
                    out_left[..len].copy_from_slice(&left_in[..len]);
                    right[..len].copy_from_slice(&right_in[..len]);
                }
                None => out_left[..len].copy_from_slice(&left_in[..len]),
            }
            self.publish_bypass();
            return;
        }

        self.peaks[0].process_block(&left_in[..len]);
        self.peaks[1].process_block(&right_in[..len]);

        let mut start = 0;
        while start < len {
            let end = (start + ALIGNMENT_BUFFER_SIZE).min(len);
            self.split_pass(&left_in[start..end], &right_in[start..end]);
            self.compress_pass(
                end - start,
                &mut out_left[start..end],
                out_right.as_deref_mut().map(|out| &mut out[start..end]),
            );
            start = end;
        }

        self.publish_meters();
    }

    /// Process a stereo pair in place
    pub fn process_in_place(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        let len = left.len().min(right.len());
        if len == 0 {
            return;
        }

        self.begin_block();
        if self.runtime.bypass {
            self.publish_bypass();
            return;
        }

        self.peaks[0].process_block(&left[..len]);
        self.peaks[1].process_block(&right[..len]);

        let mut start = 0;
        while start < len {
            let end = (start + ALIGNMENT_BUFFER_SIZE).min(len);
            self.split_pass(&left[start..end], &right[start..end]);
            self.compress_pass(
                end - start,
                &mut left[start..end],
                Some(&mut right[start..end]),
            );
            start = end;
        }

        self.publish_meters();
    }

    /// Drain commands and apply staged parameters
    fn begin_block(&mut self) {
        while let Ok(command) = self.command_rx.pop() {
            match command {
                ControlCommand::Reset => self.reset_state(),
                ControlCommand::SetSampleRate(sample_rate) => self.apply_sample_rate(sample_rate),
                ControlCommand::SetCrossover(points) => self.crossover.set_points(points),
                ControlCommand::ConfigureBand(band, settings) => {
                    self.compressors[band.index()].configure(settings);
                }
            }
        }

        let generation = self.shared.params.generation();
        if generation != self.applied_generation {
            self.applied_generation = generation;
            let params = self.shared.params.snapshot();
            self.apply_parameters(&params);
        }
    }

    fn apply_parameters(&mut self, params: &ParameterSet) {
        let runtime = RuntimeParams::from_parameters(params);
        if runtime.time_scale != self.runtime.time_scale {
            for compressor in self.compressors.iter_mut() {
                compressor.set_time_scale(runtime.time_scale);
            }
        }
        self.runtime = runtime;
    }

    fn apply_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.crossover.set_sample_rate(sample_rate);
        if SampleRate::new(sample_rate).is_some() {
            for compressor in self.compressors.iter_mut() {
                compressor.set_sample_rate(sample_rate);
            }
        }
    }

    fn reset_state(&mut self) {
        self.crossover.reset();
        self.alignment.reset();
        for compressor in self.compressors.iter_mut() {
            compressor.reset();
        }
        self.depth.reset();
        self.drive.reset();
        self.output.reset();
        for peak in self.peaks.iter_mut() {
            peak.reset();
        }
        self.shared.meters.clear();
    }

    #[inline]
    fn split_pass(&mut self, left: &[Sample], right: &[Sample]) {
        let RuntimeParams {
            depth: depth_target,
            drive: drive_target,
            advanced,
            ..
        } = self.runtime;

        for (&l, &r) in left.iter().zip(right) {
            let depth = self.depth.next(depth_target);
            let drive = self.drive.next(drive_target);
            let band_scale = depth * COMPRESSION_SCALING + 1.0;
            let input = StereoSample::new(l, r).scale(drive);

            let (bands_l, bands_r) = if advanced {
                let mid = drive * MID_SHAPING + 1.0;
                let high = drive * HIGH_SHAPING + 1.0;
                let (bands_l, bands_r) = self.crossover.split(input);
                (shape(bands_l, mid, high), shape(bands_r, mid, high))
            } else {
                self.crossover.split_low_high(input)
            };

            let frame: [Sample; LANE_COUNT] = [
                bands_l.low * band_scale,
                bands_r.low * band_scale,
                bands_l.mid * band_scale,
                bands_r.mid * band_scale,
                bands_l.high * band_scale,
                bands_r.high * band_scale,
                l,
                r,
            ];
            self.alignment.write_frame(&frame);
        }
    }

    #[inline]
    fn compress_pass(
        &mut self,
        len: usize,
        out_left: &mut [Sample],
        mut out_right: Option<&mut [Sample]>,
    ) {
        let count = self.alignment.begin_read(len);
        let band_gains = self.runtime.band_gains;

        for i in 0..count {
            let level = self.output.next(OUTPUT_LEVEL_TARGET);
            let frame = self.alignment.read_frame();

            let mut mix = StereoSample::SILENCE;
            for (band, compressor) in self.compressors.iter_mut().enumerate() {
                let sample = StereoSample::new(frame[band * 2], frame[band * 2 + 1]);
                let gain = compressor.process(
                    sample.power() + POWER_FLOOR,
                    level,
                    band_gains[band],
                    NEPER_PER_DB,
                );
                mix = mix + sample.scale(gain);
            }
            let mix = mix.scale(level);

            match out_right.as_deref_mut() {
                Some(right) => {
                    out_left[i] = mix.left;
                    right[i] = mix.right;
                }
                // Single output: the second channel collapses onto the first
                None => out_left[i] = mix.right,
            }
        }
    }

    fn publish_meters(&self) {
        let meters = &self.shared.meters;
        for (meter, peak) in meters.peak.iter().zip(&self.peaks) {
            meter.store(peak.value());
        }
        for (band, compressor) in self.compressors.iter().enumerate() {
            meters.band_gain[band].store(compressor.envelope_output() * self.runtime.band_gains[band]);
            meters.band_rms[band].store(compressor.rms());
            meters.band_active[band].store(compressor.is_active(), Ordering::Relaxed);
        }
        meters.advanced.store(self.runtime.advanced, Ordering::Relaxed);
        meters.bypassed.store(self.runtime.bypass, Ordering::Relaxed);
    }

    /// Bypassed blocks leave every meter but the mode flags untouched
    fn publish_bypass(&self) {
        let meters = &self.shared.meters;
        meters.advanced.store(self.runtime.advanced, Ordering::Relaxed);
        meters.bypassed.store(true, Ordering::Relaxed);
    }

    // ============ Inspection ============

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Parameters as currently staged
    pub fn parameters(&self) -> ParameterSet {
        self.shared.params.snapshot()
    }

    /// Parameters as applied at the last block boundary
    pub fn runtime(&self) -> &RuntimeParams {
        &self.runtime
    }

    pub fn crossover(&self) -> &CrossoverNetwork {
        &self.crossover
    }

    pub fn compressor(&self, band: Band) -> &CompressorBand {
        &self.compressors[band.index()]
    }

    pub fn alignment(&self) -> &BandAlignmentBuffer {
        &self.alignment
    }

    /// Peak envelope per channel
    pub fn peak(&self, channel: usize) -> f64 {
        self.peaks.get(channel).map_or(0.0, PeakEnvelopeFollower::value)
    }
}

#[inline(always)]
fn shape(bands: ChannelBands, mid: f64, high: f64) -> ChannelBands {
    ChannelBands {
        low: bands.low,
        mid: bands.mid * mid,
        high: bands.high * high,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, freq: f64, amplitude: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn test_missing_buffers_are_noop() {
        let (mut engine, _ctl) = Engine::new(EngineConfig::default());
        let input = sine(64, 440.0, 0.5);
        let mut out = vec![7.0; 64];

        engine.process(&[], &mut [&mut out[..]], 64);
        engine.process(&[&input[..]], &mut [], 64);
        engine.process(&[&input[..]], &mut [&mut out[..]], 0);
        assert!(out.iter().all(|&x| x == 7.0));
        assert!(engine.alignment().is_clear());
    }

    #[test]
    fn test_parameters_applied_at_block_start() {
        let (mut engine, _ctl) = Engine::new(EngineConfig::default());
        engine.set_parameter(ParameterId::AdvancedMode.index(), 1.0);
        assert!(!engine.runtime().advanced);

        let input = sine(32, 440.0, 0.5);
        let mut out = vec![0.0; 32];
        engine.process(&[&input[..]], &mut [&mut out[..]], 32);
        assert!(engine.runtime().advanced);
    }

    #[test]
    fn test_time_parameter_reaches_compressors() {
        let (mut engine, _ctl) = Engine::new(EngineConfig::default());
        let fresh = engine.compressor(Band::Low).clone();
        engine.set_parameter(ParameterId::Time.index(), 1.0);
        let mut l = vec![0.0; 16];
        let mut r = vec![0.0; 16];
        engine.process_in_place(&mut l, &mut r);
        assert!((engine.runtime().time_scale - 1.9).abs() < 1e-12);

        let mut a = fresh;
        let mut b = engine.compressor(Band::Low).clone();
        a.reset();
        b.reset();
        for _ in 0..100 {
            a.process(0.5, 1.0, 1.0, NEPER_PER_DB);
            b.process(0.5, 1.0, 1.0, NEPER_PER_DB);
        }
        assert!(a.rms() > b.rms());
    }

    #[test]
    fn test_long_block_is_chunked() {
        let (mut engine, _ctl) = Engine::new(EngineConfig::default());
        let len = ALIGNMENT_BUFFER_SIZE + 1000;
        let input = sine(len, 220.0, 0.3);
        let mut out = vec![f64::NAN; len];
        engine.process(&[&input[..]], &mut [&mut out[..]], len);
        assert!(out.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_invalid_sample_rate_passes_through() {
        let (mut engine, _ctl) = Engine::new(EngineConfig::default());
        engine.set_sample_rate(0.0);
        assert!(engine.crossover().is_bypassed());
        engine.set_sample_rate(48000.0);
        assert!(!engine.crossover().is_bypassed());
        assert_eq!(engine.sample_rate(), 48000.0);
    }
}
