//! Single-bin spectral power via the Goertzel algorithm.
//!
//! The attention metric only needs the power around one frequency (the centre of the alpha
//! band), so a full FFT is unnecessary. The Goertzel recurrence evaluates one DFT bin in
//! O(len) with two state variables:
//!
//! ```text
//! coeff = 2 cos(2π f_target / f_s)
//! q0    = coeff*q1 - q2 + x[n];  q2 = q1;  q1 = q0
//! power = q1² + q2² - q1*q2*coeff
//! ```
//!
//! No square root is taken. The power is multiplied by [`ALPHA_SCORE_SCALE`] and clamped
//! to `[0, ATTENTION_MAX]`; the scale is an empirical knob, not a physical unit.

use crate::constants::{ALPHA_SCORE_SCALE, ALPHA_TARGET_HZ, ATTENTION_MAX, SAMPLE_RATE_HZ};
use crate::data::sample::Sample;

/// Squared magnitude of the DFT bin at `target_hz` over `window`.
pub fn goertzel_power(window: &[Sample], target_hz: f64, sample_rate_hz: f64) -> f64 {
    let coeff = 2.0 * (2.0 * std::f64::consts::PI * target_hz / sample_rate_hz).cos();

    let (q1, q2) = window.iter().fold((0.0_f64, 0.0_f64), |(q1, q2), &s| {
        let q0 = coeff * q1 - q2 + f64::from(s);
        (q0, q1)
    });

    q1 * q1 + q2 * q2 - q1 * q2 * coeff
}

/// Goertzel-based alpha power estimator producing the bounded attention score.
///
/// Stateless per call: the window is only read, and identical windows give identical scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaEstimator {
    target_hz: f64,
    sample_rate_hz: f64,
    scale: f64,
}

impl AlphaEstimator {
    /// Estimator tuned to the pipeline constants (10 Hz at 100 Hz sampling).
    pub const fn new() -> Self {
        Self {
            target_hz: ALPHA_TARGET_HZ,
            sample_rate_hz: SAMPLE_RATE_HZ,
            scale: ALPHA_SCORE_SCALE,
        }
    }

    /// Raw bin power over `window`.
    pub fn power(&self, window: &[Sample]) -> f64 {
        goertzel_power(window, self.target_hz, self.sample_rate_hz)
    }

    /// Attention score in `[0, ATTENTION_MAX]`.
    pub fn score(&self, window: &[Sample]) -> u8 {
        let scaled = self.power(window) * self.scale;
        // Rounding can leave a tiny negative residue for near-silent windows.
        scaled.clamp(0.0, f64::from(ATTENTION_MAX)) as u8
    }
}

impl Default for AlphaEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BUFFER_SIZE;
    use std::f64::consts::PI;

    fn sine_window(frequency: f64, amplitude: f64, len: usize) -> Vec<Sample> {
        (0..len)
            .map(|n| (amplitude * (2.0 * PI * frequency * n as f64 / SAMPLE_RATE_HZ).sin()) as Sample)
            .collect()
    }

    #[test]
    fn test_alpha_dominates_neighbouring_bands() {
        let estimator = AlphaEstimator::new();

        let score_2hz = estimator.score(&sine_window(2.0, 1000.0, BUFFER_SIZE));
        let score_10hz = estimator.score(&sine_window(10.0, 1000.0, BUFFER_SIZE));
        let score_20hz = estimator.score(&sine_window(20.0, 1000.0, BUFFER_SIZE));

        assert!(f64::from(score_10hz) > f64::from(score_2hz) * 1.5);
        assert!(f64::from(score_10hz) > f64::from(score_20hz) * 1.5);
        for score in [score_2hz, score_10hz, score_20hz] {
            assert!(score <= ATTENTION_MAX);
        }
    }

    #[test]
    fn test_silence_scores_zero() {
        let estimator = AlphaEstimator::new();
        assert_eq!(estimator.power(&[0; BUFFER_SIZE]), 0.0);
        assert_eq!(estimator.score(&[0; BUFFER_SIZE]), 0);
        assert_eq!(estimator.score(&[]), 0);
    }

    #[test]
    fn test_full_scale_input_clamps_to_max() {
        let estimator = AlphaEstimator::new();
        let window = sine_window(10.0, 32_000.0, BUFFER_SIZE);
        assert_eq!(estimator.score(&window), ATTENTION_MAX);
    }

    #[test]
    fn test_identical_windows_give_identical_scores() {
        let estimator = AlphaEstimator::new();
        let window = sine_window(9.0, 150.0, BUFFER_SIZE);
        assert_eq!(estimator.power(&window), estimator.power(&window));
        assert_eq!(estimator.score(&window), estimator.score(&window));
    }

    #[test]
    fn test_power_peaks_at_target_frequency() {
        let window = sine_window(10.0, 500.0, 100);
        let at_target = goertzel_power(&window, 10.0, SAMPLE_RATE_HZ);
        let off_target = goertzel_power(&window, 25.0, SAMPLE_RATE_HZ);
        assert!(at_target > 100.0 * off_target);
    }
}
