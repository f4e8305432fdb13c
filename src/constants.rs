//! Compile-time pipeline constants.
//!
//! These values define the acquisition rate, buffer geometry, detector tuning and filter
//! design. They are deliberately not part of the runtime configuration: changing any of
//! them changes the meaning of the stored data or the frequency response of the pipeline,
//! so they are fixed at build time.
//!
//! # Units
//!
//! One sample unit equals 0.1 mV ([`SAMPLE_UNITS_PER_MILLIVOLT`] units per millivolt), so
//! [`BLINK_THRESHOLD`] of 20 units corresponds to a 2.0 mV step between two consecutive
//! filtered samples.

use std::time::Duration;

/// Number of sample slots in the ring buffer.
pub const BUFFER_SIZE: usize = 256;

/// Period between two samples (and between two processing cycles), in milliseconds.
pub const SAMPLE_PERIOD_MS: u64 = 10;

/// Sample period as a [`Duration`].
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(SAMPLE_PERIOD_MS);

/// Sample rate in Hz, derived from [`SAMPLE_PERIOD_MS`].
pub const SAMPLE_RATE_HZ: f64 = 1000.0 / SAMPLE_PERIOD_MS as f64;

/// Storage scale: sample units per millivolt (1 unit = 0.1 mV).
pub const SAMPLE_UNITS_PER_MILLIVOLT: f64 = 10.0;

/// Minimum absolute derivative (in sample units) between consecutive filtered samples
/// that counts as a blink. The comparison is strict.
pub const BLINK_THRESHOLD: i32 = 20;

/// Number of samples ignored after a detected blink (200 ms at 100 Hz).
pub const REFRACTORY_PERIOD_SAMPLES: u16 = 20;

/// Number of processed samples between two attention score refreshes (0.5 s at 100 Hz).
pub const ALPHA_WINDOW_SAMPLES: usize = 50;

/// Centre of the alpha band, in Hz.
pub const ALPHA_TARGET_HZ: f64 = 10.0;

/// Empirical calibration knob mapping Goertzel power to the attention score.
pub const ALPHA_SCORE_SCALE: f64 = 0.000_01;

/// Upper bound of the attention score.
pub const ATTENTION_MAX: u8 = 100;

/// Bandpass numerator coefficients `[b0, b1, b2]` (2nd-order Butterworth, 0.5-30 Hz @ 100 Hz).
pub const BANDPASS_B: [f64; 3] = [0.3913, 0.0, -0.3913];

/// Bandpass denominator coefficients `[a0, a1, a2]`, with `a0` normalised to 1.
pub const BANDPASS_A: [f64; 3] = [1.0, -0.2162, 0.2174];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rate_is_derived_from_period() {
        assert_eq!(SAMPLE_RATE_HZ, 100.0);
        assert_eq!(SAMPLE_PERIOD, Duration::from_millis(10));
    }

    #[test]
    fn alpha_target_is_below_nyquist() {
        assert!(ALPHA_TARGET_HZ < SAMPLE_RATE_HZ / 2.0);
        assert!(ALPHA_WINDOW_SAMPLES <= BUFFER_SIZE);
    }

    #[test]
    fn bandpass_denominator_is_normalised() {
        assert_eq!(BANDPASS_A[0], 1.0);
        // DC gain is zero: the numerator sums to nothing.
        assert_eq!(BANDPASS_B.iter().sum::<f64>(), 0.0);
    }
}
