//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and safe to call from the audio thread.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Numeric Environment
//!
//! Recursive filters decay toward zero and can land in the subnormal range,
//! where many CPUs slow down by orders of magnitude. The workspace forbids
//! `unsafe`, so instead of toggling the FTZ/DAZ control bits every recursive
//! state update goes through [`flush_denormal`].
//!
//! # Pitch
//!
//! - [`log_pitch_to_hz`] - Octaves relative to a reference frequency to Hz

use libm::{expf, exp2f, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use cadenza_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below 1e-10 are clamped, so silence maps to -200 dB.
///
/// # Example
/// ```rust
/// use cadenza_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Flush values in the subnormal range to zero.
///
/// Stands in for hardware flush-to-zero in recursive filter state.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Convert a log pitch (octaves relative to `reference_hz`) to Hz.
///
/// # Example
/// ```rust
/// use cadenza_core::log_pitch_to_hz;
///
/// assert!((log_pitch_to_hz(1.0, 440.0) - 880.0).abs() < 0.01);
/// assert!((log_pitch_to_hz(-1.0, 440.0) - 220.0).abs() < 0.01);
/// ```
#[inline]
pub fn log_pitch_to_hz(octaves: f32, reference_hz: f32) -> f32 {
    reference_hz * exp2f(octaves)
}

/// Multiply `buffer` by `gain` sample by sample.
///
/// Only the overlapping prefix of the two slices is processed.
#[inline]
pub fn multiply_in_place(buffer: &mut [f32], gain: &[f32]) {
    for (sample, g) in buffer.iter_mut().zip(gain.iter()) {
        *sample *= *g;
    }
}

/// Root mean square of a buffer. Empty buffers report 0.
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = buffer.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / buffer.len() as f32)
}

/// Absolute peak of a buffer.
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_round_trip() {
        for db in [-40.0, -12.0, 0.0, 6.0] {
            let back = linear_to_db(db_to_linear(db));
            assert!((back - db).abs() < 1e-3, "{db} dB came back as {back}");
        }
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1.0), 1.0);
        assert_eq!(flush_denormal(-0.5), -0.5);
        assert_eq!(flush_denormal(1e-10), 1e-10);

        assert_eq!(flush_denormal(1e-21), 0.0);
        assert_eq!(flush_denormal(-1e-21), 0.0);
        assert_eq!(flush_denormal(1e-38), 0.0);
        assert_eq!(flush_denormal(0.0), 0.0);
    }

    #[test]
    fn test_multiply_in_place_uses_shorter_length() {
        let mut buf = [1.0, 2.0, 3.0];
        multiply_in_place(&mut buf, &[0.5, 0.5]);
        assert_eq!(buf, [0.5, 1.0, 3.0]);
    }

    #[test]
    fn test_rms_and_peak() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(peak(&[0.2, -0.7, 0.5]), 0.7);
    }
}
