//! Sample representation, shared buffer and signal processing.
pub mod blink;
pub mod goertzel;
pub mod iir_filter;
pub mod ring_buffer;
pub mod sample;

pub use blink::{BlinkDetector, BlinkEvent, DetectorPhase};
pub use goertzel::{goertzel_power, AlphaEstimator};
pub use iir_filter::BandpassFilter;
pub use ring_buffer::{RingBuffer, Window};
pub use sample::Sample;
