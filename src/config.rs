use serde::{Deserialize, Serialize};

use crate::codec::REFCLK_DEFAULT;
use crate::control::Waveform;
use crate::state::Slot;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Master clock (MCLK) frequency in Hz.
    pub refclk: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refclk: REFCLK_DEFAULT,
        }
    }
}

/// Complete output description, see [`crate::Ad9833::setup_signal`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub frequency_slot: Slot,
    /// Output frequency in Hz
    pub frequency: f64,
    pub phase_slot: Slot,
    /// Phase offset in degrees
    pub phase: f32,
    pub waveform: Waveform,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            frequency_slot: Slot::Reg0,
            frequency: 1e3,
            phase_slot: Slot::Reg0,
            phase: 0.0,
            waveform: Waveform::Sine,
        }
    }
}
