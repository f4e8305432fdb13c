//! Sample representation and scale conversion.

use crate::constants::SAMPLE_UNITS_PER_MILLIVOLT;

/// A single stored sample: a voltage-derived magnitude in units of 0.1 mV.
pub type Sample = i16;

/// Convert a voltage reading in millivolts to the stored sample scale.
///
/// The product is truncated toward zero and saturates at the `i16` bounds instead of
/// wrapping, so an out-of-range reading clips rather than flipping sign. `NaN` maps to 0.
pub fn sample_from_millivolts(millivolts: f64) -> Sample {
    // `as` from f64 to i16 truncates and saturates.
    (millivolts * SAMPLE_UNITS_PER_MILLIVOLT) as Sample
}

/// Convert a stored sample back to millivolts.
pub fn sample_to_millivolts(sample: Sample) -> f64 {
    f64::from(sample) / SAMPLE_UNITS_PER_MILLIVOLT
}
