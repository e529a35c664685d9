use serde::{Deserialize, Serialize};

use crate::codec::{clamp_frequency, normalize_phase};
use crate::control::{compose, Control, Waveform};

/// One of the two frequency or phase registers.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Slot {
    #[default]
    Reg0,
    Reg1,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Self::Reg0 => 0,
            Self::Reg1 => 1,
        }
    }
}

/// Output and power state reflected in the control register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// `false` holds the chip in reset with the output at midscale.
    pub output_enabled: bool,
    /// Internal clock and DAC off, regardless of the other fields.
    pub sleep_enabled: bool,
    pub dac_enabled: bool,
    pub clock_enabled: bool,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            output_enabled: false,
            sleep_enabled: false,
            dac_enabled: true,
            clock_enabled: true,
        }
    }
}

/// Registers driving the output pin.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Source {
    pub frequency: Slot,
    pub phase: Slot,
}

/// Mirror of everything programmed into the chip.
///
/// The chip is write-only, this is the only record of its registers.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    frequency: [f64; 2],
    phase: [f32; 2],
    waveform: [Waveform; 2],
    mode: Mode,
    source: Source,
}

impl Default for State {
    fn default() -> Self {
        Self {
            frequency: [1e3; 2],
            phase: [0.0; 2],
            waveform: [Waveform::Sine; 2],
            mode: Mode::default(),
            source: Source::default(),
        }
    }
}

impl State {
    /// Last frequency programmed into `slot`, in Hz.
    pub fn frequency(&self, slot: Slot) -> f64 {
        self.frequency[slot.index()]
    }

    /// Last phase programmed into `slot`, in degrees within `[0, 360)`.
    pub fn phase(&self, slot: Slot) -> f32 {
        self.phase[slot.index()]
    }

    pub fn waveform(&self, slot: Slot) -> Waveform {
        self.waveform[slot.index()]
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Control word for the current state.
    ///
    /// The waveform pattern is always the one of the active frequency register.
    pub fn control(&self) -> Control {
        compose(self.mode, self.source, self.waveform(self.source.frequency))
    }

    pub(crate) fn set_frequency(&mut self, slot: Slot, frequency: f64) -> f64 {
        let clamped = clamp_frequency(frequency);
        if clamped != frequency {
            log::debug!("Frequency {frequency} Hz clamped to {clamped} Hz");
        }
        self.frequency[slot.index()] = clamped;
        clamped
    }

    pub(crate) fn set_phase(&mut self, slot: Slot, phase: f32) -> f32 {
        let phase = normalize_phase(phase);
        self.phase[slot.index()] = phase;
        phase
    }

    pub(crate) fn set_waveform(&mut self, slot: Slot, waveform: Waveform) {
        self.waveform[slot.index()] = waveform;
    }

    pub(crate) fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    pub(crate) fn set_source(&mut self, frequency: Slot, phase: Option<Slot>) {
        self.source = Source {
            frequency,
            phase: phase.unwrap_or(frequency),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = State::default();
        for slot in [Slot::Reg0, Slot::Reg1] {
            assert_eq!(s.frequency(slot), 1e3);
            assert_eq!(s.phase(slot), 0.0);
            assert_eq!(s.waveform(slot), Waveform::Sine);
        }
        assert!(!s.mode().output_enabled);
        assert_eq!(s.source(), Source::default());
        assert_eq!(s.control().raw_value(), 0x2100);
    }

    #[test]
    fn same_as_frequency_source() {
        let mut s = State::default();
        s.set_source(Slot::Reg1, None);
        assert_eq!(
            s.source(),
            Source {
                frequency: Slot::Reg1,
                phase: Slot::Reg1
            }
        );
        s.set_source(Slot::Reg0, Some(Slot::Reg1));
        assert_eq!(s.source().phase, Slot::Reg1);
    }

    #[test]
    fn clamps_and_normalizes() {
        let mut s = State::default();
        assert_eq!(s.set_frequency(Slot::Reg1, 0.01), 0.1);
        assert_eq!(s.set_frequency(Slot::Reg1, 1e9), 12.5e6);
        assert_eq!(s.frequency(Slot::Reg0), 1e3);
        assert_eq!(s.set_phase(Slot::Reg0, -90.0), 270.0);
        assert_eq!(s.phase(Slot::Reg0), 270.0);
    }
}
