//! td-engine: Real-time processing engine for Trident
//!
//! [`Engine`] lives on the audio thread and owns all DSP state.
//! [`EngineController`] is the control-side handle: parameter writes go through
//! lock-free staging cells, structural changes (reset, sample rate, crossover,
//! band settings) through a bounded command queue. Both are applied at the
//! start of the next processing block.

mod config;
mod controller;
mod engine;
mod shared;

pub use config::*;
pub use controller::*;
pub use engine::*;
pub use shared::*;
