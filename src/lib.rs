//! # EEG DAQ Core Library
//!
//! Real-time acquisition and interpretation for a wearable single-channel EEG headset: a
//! 100 Hz sampler feeds a shared ring buffer, a processor bandpass-filters each sample, detects
//! eye blinks and periodically scores alpha-band power as an attention level. The two metrics
//! are published to a BLE peer.
//!
//! ## Crate Structure
//!
//! - **`constants`**: Compile-time pipeline constants (buffer size, sample period, thresholds,
//!   filter coefficients).
//! - **`data`**: The `Sample` type, the mutex-guarded `RingBuffer`, the biquad
//!   `BandpassFilter`, the Goertzel `AlphaEstimator` and the `BlinkDetector` state machine.
//! - **`metrics`**: `MetricsStore`, the atomically updated blink count and attention level.
//! - **`pipeline`**: The periodic `Sampler` and `Processor` tasks and their spawn/shutdown
//!   handle.
//! - **`hardware`**: Capability traits for the ADC and the BLE stack, plus simulated devices.
//! - **`notify`**: GATT service bring-up state machine and the change-driven metrics notifier.
//! - **`config`**: Figment-based runtime configuration.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`error`**: The crate-wide `DaqError` enum.

pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod pipeline;

pub use error::{AppResult, DaqError};
