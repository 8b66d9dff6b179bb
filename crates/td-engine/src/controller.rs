//! Control-side handle
//!
//! Shareable between UI and automation threads (`&self` everywhere). The
//! mutexes guard control-side resources only; the audio thread never touches
//! them.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rtrb::Producer;
use td_core::{
    Band, PARAM_COUNT, ParameterId, ParameterSet, PresetBank, SampleRate, TdError, TdResult,
};
use td_dsp::{CompressorSettings, CrossoverPoints};

use crate::engine::ControlCommand;
use crate::shared::{MeterSnapshot, SharedState};

/// Handle for controlling the engine from non-audio threads
pub struct EngineController {
    shared: Arc<SharedState>,
    command_tx: Mutex<Producer<ControlCommand>>,
    presets: Mutex<PresetBank>,
}

impl EngineController {
    pub(crate) fn new(shared: Arc<SharedState>, command_tx: Producer<ControlCommand>) -> Self {
        Self {
            shared,
            command_tx: Mutex::new(command_tx),
            presets: Mutex::new(PresetBank::new()),
        }
    }

    fn send(&self, command: ControlCommand) -> TdResult<()> {
        self.command_tx.lock().push(command).map_err(|err| {
            log::warn!("Command queue full, dropped {err:?}");
            TdError::QueueFull
        })
    }

    // ============ Parameters ============

    /// Stage a value by host index; out-of-range indices are ignored
    pub fn set_parameter(&self, index: usize, value: f64) {
        match ParameterId::from_index(index) {
            Some(id) => {
                self.set(id, value);
            }
            None => log::warn!("Ignoring parameter index {index} (have {PARAM_COUNT})"),
        }
    }

    /// Strict variant of [`Self::set_parameter`]
    pub fn try_set_parameter(&self, index: usize, value: f64) -> TdResult<f64> {
        let id = ParameterId::from_index(index).ok_or(TdError::InvalidParam(index))?;
        Ok(self.set(id, value))
    }

    /// Stage a value; returns the clamped value
    pub fn set(&self, id: ParameterId, value: f64) -> f64 {
        self.shared.params.store(id, value)
    }

    /// Last raw value set; 0.0 for out-of-range indices
    pub fn get_parameter(&self, index: usize) -> f64 {
        ParameterId::from_index(index)
            .map(|id| self.get(id))
            .unwrap_or(0.0)
    }

    pub fn get(&self, id: ParameterId) -> f64 {
        self.shared.params.load(id)
    }

    pub fn parameters(&self) -> ParameterSet {
        self.shared.params.snapshot()
    }

    /// Stage all twenty values at once
    pub fn set_parameters(&self, params: &ParameterSet) {
        self.shared.params.store_all(params);
    }

    /// Display string for the current value of a parameter
    pub fn display_value(&self, id: ParameterId) -> String {
        id.format_value(self.get(id))
    }

    // ============ Commands ============

    /// Queue a sample rate change; an invalid rate makes the crossover pass-through
    pub fn set_sample_rate(&self, sample_rate: f64) -> TdResult<()> {
        if SampleRate::new(sample_rate).is_none() {
            log::warn!("Invalid sample rate {sample_rate}; crossover will run as pass-through");
        } else {
            log::debug!("Queueing sample rate {sample_rate} Hz");
        }
        self.send(ControlCommand::SetSampleRate(sample_rate))
    }

    pub fn reset(&self) -> TdResult<()> {
        log::debug!("Queueing engine reset");
        self.send(ControlCommand::Reset)
    }

    pub fn set_crossover(&self, points: CrossoverPoints) -> TdResult<()> {
        log::debug!("Queueing crossover {points:?}");
        self.send(ControlCommand::SetCrossover(points))
    }

    pub fn configure_band(&self, band: Band, settings: CompressorSettings) -> TdResult<()> {
        log::debug!("Queueing {} band settings {settings:?}", band.name());
        self.send(ControlCommand::ConfigureBand(band, settings))
    }

    // ============ Meters ============

    pub fn meters(&self) -> MeterSnapshot {
        self.shared.meters.snapshot()
    }

    // ============ Presets ============

    /// Store the staged parameters in a preset slot
    pub fn save_preset(&self, slot: usize) -> TdResult<()> {
        let params = self.parameters();
        self.presets.lock().store(slot, params)
    }

    /// Recall a preset slot and stage all of its values
    pub fn load_preset(&self, slot: usize) -> TdResult<()> {
        let params = self.presets.lock().recall(slot)?;
        self.set_parameters(&params);
        Ok(())
    }

    pub fn current_preset(&self) -> usize {
        self.presets.lock().current_slot()
    }

    pub fn preset_bank(&self) -> PresetBank {
        self.presets.lock().clone()
    }

    pub fn replace_preset_bank(&self, bank: PresetBank) {
        *self.presets.lock() = bank;
    }

    pub fn save_presets(&self, path: impl AsRef<Path>) -> TdResult<()> {
        self.presets.lock().save_to_file(path)
    }

    pub fn load_presets(&self, path: impl AsRef<Path>) -> TdResult<()> {
        let bank = PresetBank::load_from_file(path)?;
        self.replace_preset_bank(bank);
        Ok(())
    }
}
