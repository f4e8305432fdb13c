//! Fixed-coefficient IIR bandpass filter for the raw sample stream.
//!
//! A single second-order section (Direct Form I, provided by the `biquad` crate) with the
//! coefficients from [`BANDPASS_B`] / [`BANDPASS_A`]: a Butterworth design approximating a
//! 0.5-30 Hz passband at 100 Hz. All arithmetic is `f64`; the result is truncated to the
//! [`Sample`] domain only at the output.
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
//! ```

use biquad::{Biquad, Coefficients, DirectForm1};

use crate::constants::{BANDPASS_A, BANDPASS_B};
use crate::data::sample::Sample;

/// The fixed bandpass coefficient set.
pub fn bandpass_coefficients() -> Coefficients<f64> {
    Coefficients {
        a1: BANDPASS_A[1],
        a2: BANDPASS_A[2],
        b0: BANDPASS_B[0],
        b1: BANDPASS_B[1],
        b2: BANDPASS_B[2],
    }
}

/// Stateful bandpass filter: one raw sample in, one band-limited sample out.
///
/// The input and output histories live inside the filter and are only mutated by
/// [`apply`](Self::apply) and [`reset`](Self::reset).
pub struct BandpassFilter {
    coefficients: Coefficients<f64>,
    filter: DirectForm1<f64>,
}

impl BandpassFilter {
    /// Create a filter with zeroed history.
    pub fn new() -> Self {
        let coefficients = bandpass_coefficients();
        Self {
            coefficients,
            filter: DirectForm1::<f64>::new(coefficients),
        }
    }

    /// Filter one sample.
    ///
    /// The output is truncated toward zero and saturates at the `i16` bounds.
    pub fn apply(&mut self, input: Sample) -> Sample {
        self.filter.run(f64::from(input)) as Sample
    }

    /// Zero the input and output histories.
    pub fn reset(&mut self) {
        self.filter = DirectForm1::<f64>::new(self.coefficients);
    }
}

impl Default for BandpassFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BandpassFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BandpassFilter")
            .field("b", &BANDPASS_B)
            .field("a", &BANDPASS_A)
            .finish_non_exhaustive()
    }
}
