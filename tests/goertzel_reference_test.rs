//! Goertzel vs FFT reference
//!
//! The Goertzel recurrence computes the squared magnitude of one DFT bin. When the target
//! frequency falls exactly on a bin, the result must match the FFT of the same window.

use eeg_daq::constants::SAMPLE_RATE_HZ;
use eeg_daq::data::{goertzel_power, AlphaEstimator, Sample};
use num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

const LEN: usize = 100;

fn two_tone() -> Vec<Sample> {
    (0..LEN)
        .map(|n| {
            let t = n as f64 / SAMPLE_RATE_HZ;
            let v = 800.0 * (2.0 * PI * 10.0 * t).sin() + 300.0 * (2.0 * PI * 23.0 * t + 0.4).cos();
            v as Sample
        })
        .collect()
}

fn fft_bin_power(window: &[Sample], bin: usize) -> f64 {
    let mut buffer: Vec<Complex<f64>> = window
        .iter()
        .map(|&s| Complex::new(f64::from(s), 0.0))
        .collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    buffer[bin].norm_sqr()
}

#[test]
fn test_goertzel_matches_fft_bin() {
    let window = two_tone();
    // 1 Hz bin spacing for 100 samples at 100 Hz.
    for frequency in [10usize, 23] {
        let goertzel = goertzel_power(&window, frequency as f64, SAMPLE_RATE_HZ);
        let fft = fft_bin_power(&window, frequency);
        assert!(
            (goertzel - fft).abs() / fft < 1e-6,
            "{frequency} Hz: goertzel {goertzel}, fft {fft}"
        );
    }
}

#[test]
fn test_estimator_power_is_the_alpha_bin() {
    let window = two_tone();
    let estimator = AlphaEstimator::new();
    let fft = fft_bin_power(&window, 10);
    assert!((estimator.power(&window) - fft).abs() / fft < 1e-6);
}
