#![no_std]

//! AD9833 low power programmable waveform generator SPI driver.
//!
//! The chip is write-only: every register write is a single 16 bit word and there is
//! no way to read anything back. The driver keeps a [`State`] mirror of what has been
//! programmed and derives every control word from it.
//!
//! Frequency updates are sent as a control word followed by the lower and the upper
//! 14 bits of the 28 bit tuning word. All words of one operation go out in a single
//! [`SpiDevice`] write with FSYNC held low, so they can not be split by traffic to
//! other devices on the bus.

use arbitrary_int::{u12, u28};
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{self, SpiDevice};

pub mod codec;
mod config;
pub mod control;
mod state;

pub use codec::{FREQUENCY_MAX, FREQUENCY_MIN, REFCLK_DEFAULT};
pub use config::{Config, Signal};
pub use control::{Command, Control, FrequencyWord, PhaseWord, Waveform};
pub use state::{Mode, Slot, Source, State};

use codec::{frequency_to_ftw, ftw_to_frequency, phase_to_pow, pow_to_phase};

/// SPI mode: data is sampled on the falling SCLK edge, SCLK idles high.
pub const MODE: spi::Mode = spi::MODE_2;

/// Settle time after power-up before the first write.
pub const POWER_UP_MS: u32 = 100;
/// Settle time after a reset.
pub const RESET_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid reference clock {0} Hz")]
    RefClk(f64),
    #[error("SPI")]
    Bus(spi::ErrorKind),
}

impl<E: spi::Error> From<E> for Error {
    fn from(value: E) -> Self {
        Self::Bus(value.kind())
    }
}

#[derive(Clone, Debug)]
pub struct Ad9833<B> {
    bus: B,
    refclk: f64,
    state: State,
}

impl<B: SpiDevice<u8>> Ad9833<B> {
    /// Create a driver with the default [`State`].
    ///
    /// Nothing is written. Use [`Ad9833::init`] to bring the chip in line with the state.
    pub fn new(bus: B, config: Config) -> Result<Self, Error> {
        if !(config.refclk.is_finite() && config.refclk > 0.0) {
            return Err(Error::RefClk(config.refclk));
        }
        Ok(Self {
            bus,
            refclk: config.refclk,
            state: State::default(),
        })
    }

    pub fn release(self) -> B {
        self.bus
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn refclk(&self) -> f64 {
        self.refclk
    }

    /// Send the words of one operation in a single bus write.
    ///
    /// FSYNC stays low across all words and the chip latches each 16 bit word in
    /// turn, so this is equivalent to one frame per word but can not be interleaved
    /// with other devices on the bus.
    fn write(&mut self, words: &[u16]) -> Result<(), Error> {
        debug_assert!(words.len() <= 3);
        let mut buf = [0; 6];
        for (word, b) in words.iter().zip(buf.chunks_exact_mut(2)) {
            log::debug!("AD9833 write {word:#06x}");
            b.copy_from_slice(&word.to_be_bytes());
        }
        Ok(self.bus.write(&buf[..2 * words.len()])?)
    }

    fn write_control(&mut self) -> Result<(), Error> {
        let control = self.state.control();
        self.write(&[control.raw_value()])
    }

    /// Wait for power-up, reset and program both register pairs and the control
    /// register from the current state.
    ///
    /// The output stays in reset unless it was enabled before.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        delay.delay_ms(POWER_UP_MS);
        self.reset(delay)?;
        for slot in [Slot::Reg0, Slot::Reg1] {
            self.set_frequency(slot, self.state.frequency(slot))?;
            self.set_phase(slot, self.state.phase(slot))?;
        }
        log::info!("AD9833 initialized");
        Ok(())
    }

    /// Reset the phase accumulators, the output goes to midscale.
    ///
    /// The state is kept. The next control word written by any other operation
    /// releases the reset if the output is enabled.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.write(&[Control::DEFAULT.with_reset(true).raw_value()])?;
        delay.delay_ms(RESET_MS);
        Ok(())
    }

    /// Program a frequency register.
    ///
    /// The frequency is clamped to `[FREQUENCY_MIN, FREQUENCY_MAX]`.
    /// Returns the tuning word written.
    pub fn set_frequency(
        &mut self,
        slot: Slot,
        frequency: f64,
    ) -> Result<u28, Error> {
        let frequency = self.state.set_frequency(slot, frequency);
        let ftw = frequency_to_ftw(frequency, self.refclk);
        let (lower, upper) = codec::split_ftw(ftw);
        let word =
            FrequencyWord::DEFAULT.with_command(Command::frequency(slot));
        // B28 is part of every control pattern: lower, then upper half
        let control = self.state.control();
        self.write(&[
            control.raw_value(),
            word.with_data(lower).raw_value(),
            word.with_data(upper).raw_value(),
        ])?;
        Ok(ftw)
    }

    pub fn increment_frequency(
        &mut self,
        slot: Slot,
        delta: f64,
    ) -> Result<u28, Error> {
        self.set_frequency(slot, self.state.frequency(slot) + delta)
    }

    /// Program a phase register, the phase is taken modulo a full turn.
    ///
    /// Returns the phase word written.
    pub fn set_phase(&mut self, slot: Slot, phase: f32) -> Result<u12, Error> {
        let phase = self.state.set_phase(slot, phase);
        let pow = phase_to_pow(phase);
        self.write(&[PhaseWord::DEFAULT
            .with_psel(slot == Slot::Reg1)
            .with_data(pow)
            .raw_value()])?;
        Ok(pow)
    }

    pub fn increment_phase(
        &mut self,
        slot: Slot,
        delta: f32,
    ) -> Result<u12, Error> {
        self.set_phase(slot, self.state.phase(slot) + delta)
    }

    /// Select the waveform generated while `slot` is the active frequency register.
    ///
    /// Only writes when `slot` is currently active.
    pub fn set_waveform(
        &mut self,
        slot: Slot,
        waveform: Waveform,
    ) -> Result<(), Error> {
        self.state.set_waveform(slot, waveform);
        if self.state.source().frequency == slot {
            self.write_control()?;
        }
        Ok(())
    }

    /// Release (`true`) or hold (`false`) the chip in reset.
    pub fn enable_output(&mut self, enable: bool) -> Result<(), Error> {
        self.state.mode_mut().output_enabled = enable;
        self.write_control()
    }

    /// Power down the internal clock and the DAC.
    pub fn sleep(&mut self, enable: bool) -> Result<(), Error> {
        self.state.mode_mut().sleep_enabled = enable;
        self.write_control()
    }

    pub fn enable_dac(&mut self, enable: bool) -> Result<(), Error> {
        self.state.mode_mut().dac_enabled = enable;
        self.write_control()
    }

    pub fn enable_internal_clock(&mut self, enable: bool) -> Result<(), Error> {
        self.state.mode_mut().clock_enabled = enable;
        self.write_control()
    }

    /// Select the frequency and phase registers driving the output.
    ///
    /// `phase: None` uses the same register as `frequency`.
    pub fn set_output_source(
        &mut self,
        frequency: Slot,
        phase: Option<Slot>,
    ) -> Result<(), Error> {
        self.state.set_source(frequency, phase);
        self.write_control()
    }

    /// Program frequency, phase and waveform and make them the output source.
    pub fn setup_signal(&mut self, signal: &Signal) -> Result<(), Error> {
        self.set_frequency(signal.frequency_slot, signal.frequency)?;
        self.set_phase(signal.phase_slot, signal.phase)?;
        self.set_waveform(signal.frequency_slot, signal.waveform)?;
        self.set_output_source(signal.frequency_slot, Some(signal.phase_slot))
    }

    /// Frequency actually generated from `slot` after quantization.
    pub fn actual_frequency(&self, slot: Slot) -> f64 {
        let ftw = frequency_to_ftw(self.state.frequency(slot), self.refclk);
        ftw_to_frequency(ftw, self.refclk)
    }

    /// Phase actually applied from `slot` after quantization.
    pub fn actual_phase(&self, slot: Slot) -> f32 {
        pow_to_phase(phase_to_pow(self.state.phase(slot)))
    }

    /// Frequency step of one tuning word LSB.
    pub fn resolution(&self) -> f64 {
        codec::resolution(self.refclk)
    }
}
