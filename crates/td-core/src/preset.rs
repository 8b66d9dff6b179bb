//! Preset bank
//!
//! Fixed number of slots, each holding a full [`ParameterSet`]. Persisted as
//! JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ParameterSet, TdError, TdResult};

/// Number of preset slots
pub const PRESET_SLOTS: usize = 32;

/// Bank of parameter presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBank {
    slots: Vec<ParameterSet>,
    current: usize,
}

impl Default for PresetBank {
    fn default() -> Self {
        Self {
            slots: vec![ParameterSet::default(); PRESET_SLOTS],
            current: 0,
        }
    }
}

impl PresetBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot most recently stored or recalled
    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn slot(&self, index: usize) -> TdResult<&ParameterSet> {
        self.slots.get(index).ok_or(TdError::InvalidPresetSlot(index))
    }

    /// Overwrite a slot and make it current
    pub fn store(&mut self, index: usize, params: ParameterSet) -> TdResult<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TdError::InvalidPresetSlot(index))?;
        *slot = params;
        self.current = index;
        log::debug!("Stored preset slot {index}");
        Ok(())
    }

    /// Fetch a slot and make it current
    pub fn recall(&mut self, index: usize) -> TdResult<ParameterSet> {
        let params = *self.slot(index)?;
        self.current = index;
        log::debug!("Recalled preset slot {index}");
        Ok(params)
    }

    pub fn to_json(&self) -> TdResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a bank; slot count must match and values are re-clamped
    pub fn from_json(json: &str) -> TdResult<Self> {
        let mut bank: PresetBank = serde_json::from_str(json)?;
        if bank.slots.len() != PRESET_SLOTS {
            return Err(TdError::Serialization(format!(
                "expected {PRESET_SLOTS} preset slots, found {}",
                bank.slots.len()
            )));
        }
        for slot in bank.slots.iter_mut() {
            *slot = ParameterSet::from_values(*slot.values());
        }
        bank.current = bank.current.min(PRESET_SLOTS - 1);
        Ok(bank)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> TdResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::debug!("Saved preset bank to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> TdResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let bank = Self::from_json(&json)?;
        log::debug!("Loaded preset bank from {}", path.display());
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterId;

    #[test]
    fn test_store_and_recall() {
        let mut bank = PresetBank::new();
        assert_eq!(bank.len(), PRESET_SLOTS);

        let mut params = ParameterSet::default();
        params.set(ParameterId::Depth, 0.9);
        bank.store(5, params).unwrap();
        assert_eq!(bank.current_slot(), 5);

        let recalled = bank.recall(5).unwrap();
        assert_eq!(recalled.get(ParameterId::Depth), 0.9);
        assert_eq!(bank.recall(0).unwrap(), ParameterSet::default());
        assert_eq!(bank.current_slot(), 0);
    }

    #[test]
    fn test_invalid_slot() {
        let mut bank = PresetBank::new();
        assert!(matches!(
            bank.store(PRESET_SLOTS, ParameterSet::default()),
            Err(TdError::InvalidPresetSlot(PRESET_SLOTS))
        ));
        assert!(matches!(bank.recall(99), Err(TdError::InvalidPresetSlot(99))));
        assert_eq!(bank.current_slot(), 0);
    }

    #[test]
    fn test_rejects_wrong_slot_count() {
        let json = r#"{"slots":[],"current":0}"#;
        assert!(matches!(
            PresetBank::from_json(json),
            Err(TdError::Serialization(_))
        ));
        assert!(PresetBank::from_json("not json").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");

        let mut bank = PresetBank::new();
        let mut params = ParameterSet::default();
        params.set(ParameterId::AdvancedMode, 1.0);
        params.set(ParameterId::HighGain, 0.2);
        bank.store(31, params).unwrap();
        bank.save_to_file(&path).unwrap();

        let loaded = PresetBank::load_from_file(&path).unwrap();
        assert_eq!(loaded, bank);
        assert_eq!(loaded.current_slot(), 31);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PresetBank::load_from_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(TdError::Io(_))));
    }
}
