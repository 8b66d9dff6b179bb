//! State shared between the audio and control threads
//!
//! Everything here is atomics only: the audio thread never blocks on it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use td_core::{PARAM_COUNT, ParameterId, ParameterSet, clamp01};

/// Atomic float for lock-free exchange
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ============ Parameter Staging ============

/// One atomic cell per host parameter plus a change counter.
///
/// Writers store the value, then bump the generation. The audio thread
/// compares generations at block start and snapshots all cells on change.
#[derive(Debug)]
pub struct ParameterCells {
    values: [AtomicF64; PARAM_COUNT],
    generation: AtomicU64,
}

impl ParameterCells {
    pub fn new(initial: &ParameterSet) -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF64::new(initial.values()[i])),
            generation: AtomicU64::new(0),
        }
    }

    /// Store a clamped value; returns what was stored
    pub fn store(&self, id: ParameterId, value: f64) -> f64 {
        let clamped = clamp01(value);
        self.values[id.index()].store(clamped);
        self.generation.fetch_add(1, Ordering::Release);
        clamped
    }

    /// Store a whole set with a single generation bump
    pub fn store_all(&self, params: &ParameterSet) {
        for (cell, &value) in self.values.iter().zip(params.values()) {
            cell.store(clamp01(value));
        }
        self.generation.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn load(&self, id: ParameterId) -> f64 {
        self.values[id.index()].load()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ParameterSet {
        ParameterSet::from_values(std::array::from_fn(|i| self.values[i].load()))
    }
}

// ============ Meters ============

/// Meter values published by the audio thread after each block
#[derive(Debug, Default)]
pub struct MeterBridge {
    pub peak: [AtomicF64; 2],
    /// `envelope_output · band_gain` per band
    pub band_gain: [AtomicF64; 3],
    /// Smoothed band power
    pub band_rms: [AtomicF64; 3],
    pub band_active: [AtomicBool; 3],
    pub advanced: AtomicBool,
    pub bypassed: AtomicBool,
}

impl MeterBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            peak: std::array::from_fn(|i| self.peak[i].load()),
            band_gain: std::array::from_fn(|i| self.band_gain[i].load()),
            band_rms: std::array::from_fn(|i| self.band_rms[i].load()),
            band_active: std::array::from_fn(|i| self.band_active[i].load(Ordering::Relaxed)),
            advanced: self.advanced.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        for meter in self.peak.iter().chain(&self.band_gain).chain(&self.band_rms) {
            meter.store(0.0);
        }
        for active in &self.band_active {
            active.store(false, Ordering::Relaxed);
        }
    }
}

/// Plain copy of the meter bridge
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub peak: [f64; 2],
    pub band_gain: [f64; 3],
    pub band_rms: [f64; 3],
    pub band_active: [bool; 3],
    pub advanced: bool,
    pub bypassed: bool,
}

impl MeterSnapshot {
    /// Rough processing load in percent
    pub fn load_estimate(&self) -> f64 {
        let mode = if self.advanced { 15.0 } else { 8.0 };
        let active = self.band_active.iter().filter(|&&a| a).count() as f64;
        (5.0 + 8.0 + mode + 2.0 * active).min(100.0)
    }
}

/// Shared block between [`crate::Engine`] and [`crate::EngineController`]
#[derive(Debug)]
pub struct SharedState {
    pub params: ParameterCells,
    pub meters: MeterBridge,
}

impl SharedState {
    pub fn new(initial: &ParameterSet) -> Self {
        Self {
            params: ParameterCells::new(initial),
            meters: MeterBridge::new(),
        }
    }
}
