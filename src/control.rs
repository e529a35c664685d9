//! Register word layouts and control word composition.
//!
//! Every write is a 16 bit word, MSB first. The two top bits select the target:
//! the control register, one of the two frequency registers or a phase register.

use arbitrary_int::{u12, u14};
use bitbybit::{bitenum, bitfield};
use serde::{Deserialize, Serialize};

use crate::state::{Mode, Slot, Source};

#[bitenum(u2, exhaustive = true)]
#[derive(PartialEq, Debug)]
pub enum Command {
    Control = 0,
    Freq0 = 1,
    Freq1 = 2,
    Phase = 3,
}

impl Command {
    pub fn frequency(slot: Slot) -> Self {
        match slot {
            Slot::Reg0 => Self::Freq0,
            Slot::Reg1 => Self::Freq1,
        }
    }
}

#[bitfield(u16, default = 0x0000)]
#[derive(Debug, PartialEq)]
pub struct Control {
    /// Triangle instead of sine, only without `opbiten`
    #[bit(1, rw)]
    pub mode: bool,
    /// Full rate comparator square wave, half rate otherwise
    #[bit(3, rw)]
    pub div2: bool,
    /// Square wave from the DAC MSB
    #[bit(5, rw)]
    pub opbiten: bool,
    /// DAC off
    #[bit(6, rw)]
    pub sleep12: bool,
    /// Internal clock off
    #[bit(7, rw)]
    pub sleep1: bool,
    #[bit(8, rw)]
    pub reset: bool,
    #[bit(10, rw)]
    pub psel: bool,
    #[bit(11, rw)]
    pub fsel: bool,
    /// Upper half for single half frequency writes
    #[bit(12, rw)]
    pub hlb: bool,
    /// Frequency writes come as consecutive lower and upper halves
    #[bit(13, rw)]
    pub b28: bool,
    #[bits(14..=15, rw)]
    pub command: Command,
}

#[bitfield(u16, default = 0x0000)]
#[derive(Debug, PartialEq)]
pub struct FrequencyWord {
    #[bits(0..=13, rw)]
    pub data: u14,
    #[bits(14..=15, rw)]
    pub command: Command,
}

#[bitfield(u16, default = 0xc000)]
#[derive(Debug, PartialEq)]
pub struct PhaseWord {
    #[bits(0..=11, rw)]
    pub data: u12,
    /// Target PHASE1
    #[bit(13, rw)]
    pub psel: bool,
    #[bits(14..=15, rw)]
    pub command: Command,
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    /// Comparator output at the full output frequency
    Square,
    /// Comparator output at half the output frequency
    HalfSquare,
}

impl Waveform {
    /// Base control pattern of the waveform.
    pub fn control(self) -> Control {
        let base = Control::DEFAULT.with_b28(true);
        match self {
            Self::Sine => base,
            Self::Triangle => base.with_mode(true),
            Self::Square => {
                base.with_sleep12(true).with_opbiten(true).with_div2(true)
            }
            Self::HalfSquare => base.with_sleep12(true).with_opbiten(true),
        }
    }

    /// The square waves bypass the DAC.
    pub fn bypasses_dac(self) -> bool {
        matches!(self, Self::Square | Self::HalfSquare)
    }
}

/// Compose the control word.
///
/// `waveform` is the waveform of the active frequency register.
pub fn compose(mode: Mode, source: Source, waveform: Waveform) -> Control {
    let base = waveform.control();
    base.with_fsel(source.frequency == Slot::Reg1)
        .with_psel(source.phase == Slot::Reg1)
        .with_reset(!mode.output_enabled)
        .with_sleep1(mode.sleep_enabled || !mode.clock_enabled)
        .with_sleep12(
            base.sleep12() || mode.sleep_enabled || !mode.dac_enabled,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAVEFORMS: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::HalfSquare,
    ];

    fn sources() -> impl Iterator<Item = Source> {
        [Slot::Reg0, Slot::Reg1].into_iter().flat_map(|frequency| {
            [Slot::Reg0, Slot::Reg1]
                .into_iter()
                .map(move |phase| Source { frequency, phase })
        })
    }

    fn modes() -> impl Iterator<Item = Mode> {
        (0..16u8).map(|b| Mode {
            output_enabled: b & 1 != 0,
            sleep_enabled: b & 2 != 0,
            dac_enabled: b & 4 != 0,
            clock_enabled: b & 8 != 0,
        })
    }

    #[test]
    fn waveform_patterns() {
        let raw: [u16; 4] = WAVEFORMS.map(|w| w.control().raw_value());
        assert_eq!(raw, [0x2000, 0x2002, 0x2068, 0x2060]);
    }

    #[test]
    fn always_control_command() {
        for waveform in WAVEFORMS {
            for source in sources() {
                for mode in modes() {
                    let c = compose(mode, source, waveform);
                    assert_eq!(c.command(), Command::Control);
                    assert!(c.b28());
                    assert!(!c.hlb());
                }
            }
        }
    }

    #[test]
    fn reset_follows_output() {
        for waveform in WAVEFORMS {
            for source in sources() {
                for mode in modes() {
                    let c = compose(mode, source, waveform);
                    assert_eq!(c.reset(), !mode.output_enabled);
                }
            }
        }
    }

    #[test]
    fn running_clears_reset_and_sleep() {
        let mode = Mode {
            output_enabled: true,
            ..Mode::default()
        };
        for waveform in WAVEFORMS {
            let c = compose(mode, Source::default(), waveform);
            assert!(!c.reset());
            assert!(!c.sleep1());
            // DAC bypass stays with the square waves
            assert_eq!(c.sleep12(), waveform.bypasses_dac());
        }
        let c = compose(mode, Source::default(), Waveform::Sine);
        assert_eq!(c.raw_value(), 0x2000);
    }

    #[test]
    fn sleep_sets_both() {
        let mode = Mode {
            output_enabled: true,
            sleep_enabled: true,
            ..Mode::default()
        };
        for waveform in WAVEFORMS {
            let c = compose(mode, Source::default(), waveform);
            assert!(c.sleep1() && c.sleep12());
        }
        assert_eq!(
            compose(mode, Source::default(), Waveform::Sine).raw_value(),
            0x20c0
        );
    }

    #[test]
    fn source_bits() {
        let mode = Mode {
            output_enabled: true,
            ..Mode::default()
        };
        let source = Source {
            frequency: Slot::Reg1,
            phase: Slot::Reg1,
        };
        assert_eq!(compose(mode, source, Waveform::Sine).raw_value(), 0x2c00);
        let source = Source {
            frequency: Slot::Reg0,
            phase: Slot::Reg1,
        };
        assert_eq!(
            compose(mode, source, Waveform::Triangle).raw_value(),
            0x2402
        );
    }

    #[test]
    fn data_words() {
        let w = PhaseWord::DEFAULT.with_data(u12::new(1024));
        assert_eq!(w.raw_value(), 0xc400);
        assert_eq!(w.with_psel(true).raw_value(), 0xe400);
        let w = FrequencyWord::DEFAULT
            .with_command(Command::frequency(Slot::Reg1))
            .with_data(u14::new(0x3fff));
        assert_eq!(w.raw_value(), 0xbfff);
        assert_eq!(w.with_command(Command::Freq0).raw_value(), 0x7fff);
    }
}
