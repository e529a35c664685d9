//! Fixed-point conversions between physical units and AD9833 register values.

use arbitrary_int::{u12, u14, u28};
use num_traits::float::FloatCore;

/// Reference clock of the common AD9833 modules (25 MHz crystal).
pub const REFCLK_DEFAULT: f64 = 25e6;

/// Lowest output frequency accepted by the driver.
pub const FREQUENCY_MIN: f64 = 0.1;
/// Highest output frequency accepted by the driver (half of a 25 MHz MCLK).
pub const FREQUENCY_MAX: f64 = 12.5e6;

const FTW_SCALE: f64 = (1u32 << 28) as f64;
const POW_SCALE: f32 = (1u32 << 12) as f32;

/// Clamp a requested frequency into the range the chip can produce.
///
/// NaN maps to the lower bound.
pub fn clamp_frequency(frequency: f64) -> f64 {
    if frequency.is_nan() {
        FREQUENCY_MIN
    } else {
        frequency.clamp(FREQUENCY_MIN, FREQUENCY_MAX)
    }
}

/// Normalize a phase in degrees into `[0, 360)`, wrapping negative values forward.
pub fn normalize_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let p = phase % 360.0;
    let p = if p < 0.0 { p + 360.0 } else { p };
    // Tiny negative inputs round up to a full turn
    if p >= 360.0 {
        0.0
    } else {
        p
    }
}

pub fn frequency_to_ftw(frequency: f64, refclk: f64) -> u28 {
    // Reduce before the integer cast, which saturates
    let ftw = (frequency * FTW_SCALE / refclk).round() % FTW_SCALE;
    // Alias into Nyquist
    u28::new((ftw as i64 as u32) & u28::MASK)
}

pub fn ftw_to_frequency(ftw: u28, refclk: f64) -> f64 {
    ftw.value() as f64 * refclk / FTW_SCALE
}

/// Split a tuning word into its `(lower, upper)` 14 bit halves.
pub fn split_ftw(ftw: u28) -> (u14, u14) {
    let ftw = ftw.value();
    (
        u14::new((ftw & u14::MASK as u32) as u16),
        u14::new(((ftw >> 14) & u14::MASK as u32) as u16),
    )
}

pub fn phase_to_pow(phase: f32) -> u12 {
    let pow = (normalize_phase(phase) * POW_SCALE / 360.0).round();
    // A phase just below a full turn rounds to 4096
    u12::new((pow as u16) & u12::MASK)
}

pub fn pow_to_phase(pow: u12) -> f32 {
    pow.value() as f32 * 360.0 / POW_SCALE
}

/// Frequency step of one tuning word LSB.
pub fn resolution(refclk: f64) -> f64 {
    refclk / FTW_SCALE
}
