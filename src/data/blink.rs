//! Debounced derivative-threshold blink detector.
//!
//! Runs over the filtered stream, one sample at a time:
//!
//! ```text
//!            |d| > BLINK_THRESHOLD
//!   Armed ───────────────────────────▶ Refractory(REFRACTORY_PERIOD_SAMPLES)
//!     ▲                                     │ every sample: k -= 1
//!     └──────────────── k == 0 ─────────────┘
//! ```
//!
//! It fires on the first threshold crossing while armed and ignores everything until the
//! refractory window elapses, so a second genuine blink inside that window is missed.
//! `previous` is updated on every sample regardless of state.

use crate::constants::{BLINK_THRESHOLD, REFRACTORY_PERIOD_SAMPLES};
use crate::data::sample::Sample;

/// Detector phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// A qualifying derivative fires a blink.
    Armed,
    /// Detections suppressed for the remaining number of samples.
    Refractory(u16),
}

/// A detected blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkEvent {
    /// Filtered sample that triggered the detection.
    pub sample: Sample,
    /// Signed difference to the previous filtered sample.
    pub derivative: i32,
}

/// Blink detector state machine.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    phase: DetectorPhase,
    previous: Sample,
    threshold: i32,
    refractory_samples: u16,
}

impl BlinkDetector {
    /// Armed detector with `previous = 0`, using the pipeline thresholds.
    pub const fn new() -> Self {
        Self::with_tuning(BLINK_THRESHOLD, REFRACTORY_PERIOD_SAMPLES)
    }

    /// Detector with a custom threshold and refractory length.
    pub const fn with_tuning(threshold: i32, refractory_samples: u16) -> Self {
        Self {
            phase: DetectorPhase::Armed,
            previous: 0,
            threshold,
            refractory_samples,
        }
    }

    /// Feed one filtered sample. Returns the event if this sample fired a blink.
    pub fn update(&mut self, current: Sample) -> Option<BlinkEvent> {
        // i32 so that i16 extremes cannot overflow.
        let derivative = i32::from(current) - i32::from(self.previous);
        self.previous = current;

        match self.phase {
            DetectorPhase::Armed if derivative.abs() > self.threshold => {
                self.phase = if self.refractory_samples == 0 {
                    DetectorPhase::Armed
                } else {
                    DetectorPhase::Refractory(self.refractory_samples)
                };
                Some(BlinkEvent {
                    sample: current,
                    derivative,
                })
            }
            DetectorPhase::Armed => None,
            DetectorPhase::Refractory(remaining) => {
                let remaining = remaining.saturating_sub(1);
                self.phase = if remaining == 0 {
                    DetectorPhase::Armed
                } else {
                    DetectorPhase::Refractory(remaining)
                };
                None
            }
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Last filtered sample seen.
    pub const fn previous(&self) -> Sample {
        self.previous
    }

    /// Return to the initial state (armed, `previous = 0`).
    pub fn reset(&mut self) {
        self.phase = DetectorPhase::Armed;
        self.previous = 0;
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_blinks(detector: &mut BlinkDetector, samples: &[Sample]) -> usize {
        samples
            .iter()
            .filter_map(|&s| detector.update(s))
            .count()
    }

    #[test]
    fn test_debounce_sequence() {
        let mut detector = BlinkDetector::new();
        let mut blinks = 0;

        // Flat signal, zero derivative.
        blinks += count_blinks(&mut detector, &[0; 20]);
        assert_eq!(blinks, 0);

        // +30 step fires once.
        blinks += count_blinks(&mut detector, &[30]);
        assert_eq!(blinks, 1);

        // Perturbations inside the refractory window are ignored, even large ones.
        blinks += count_blinks(&mut detector, &[20, 25, -40, 22, 30]);
        assert_eq!(blinks, 1);

        // Let the rest of the window elapse, then a new step fires.
        blinks += count_blinks(&mut detector, &[30; 15]);
        assert_eq!(detector.phase(), DetectorPhase::Armed);
        blinks += count_blinks(&mut detector, &[60]);
        assert_eq!(blinks, 2);

        // A negative step is detected like a positive one.
        blinks += count_blinks(&mut detector, &[60; 20]);
        blinks += count_blinks(&mut detector, &[30]);
        assert_eq!(blinks, 3);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut detector = BlinkDetector::new();
        assert!(detector.update(BLINK_THRESHOLD as Sample).is_none());
        assert!(detector.update(0).is_none());
        assert!(detector.update(-(BLINK_THRESHOLD as Sample) - 1).is_some());
    }

    #[test]
    fn test_refractory_suppresses_exactly_the_window() {
        let mut detector = BlinkDetector::new();
        assert!(detector.update(100).is_some());
        assert_eq!(
            detector.phase(),
            DetectorPhase::Refractory(REFRACTORY_PERIOD_SAMPLES)
        );

        // Alternate between large swings for the whole window: nothing fires.
        for n in 0..REFRACTORY_PERIOD_SAMPLES {
            let sample = if n % 2 == 0 { 0 } else { 100 };
            assert!(detector.update(sample).is_none(), "fired at refractory sample {n}");
        }
        assert_eq!(detector.phase(), DetectorPhase::Armed);

        // The first sample after the window can fire again.
        let next = if detector.previous() == 0 { 100 } else { 0 };
        assert!(detector.update(next).is_some());
    }

    #[test]
    fn test_event_carries_signed_derivative() {
        let mut detector = BlinkDetector::with_tuning(BLINK_THRESHOLD, 0);
        detector.update(500);

        let event = detector.update(400).unwrap();
        assert_eq!(event.sample, 400);
        assert_eq!(event.derivative, -100);
    }

    #[test]
    fn test_extreme_swing_does_not_overflow() {
        let mut armed = BlinkDetector::with_tuning(BLINK_THRESHOLD, 0);
        armed.update(Sample::MIN);

        let event = armed.update(Sample::MAX).unwrap();
        assert_eq!(event.derivative, i32::from(Sample::MAX) - i32::from(Sample::MIN));
    }

    #[test]
    fn test_previous_updates_during_refractory() {
        let mut detector = BlinkDetector::new();
        detector.update(100);
        detector.update(42);
        assert_eq!(detector.previous(), 42);
    }

    #[test]
    fn test_reset_rearms() {
        let mut detector = BlinkDetector::new();
        detector.update(100);
        detector.reset();

        assert_eq!(detector.phase(), DetectorPhase::Armed);
        assert_eq!(detector.previous(), 0);
    }
}
