//! Hardware Abstractions
//!
//! - [`capabilities`]: the ADC and BLE capability traits the pipeline is written against
//! - [`mock`]: simulated implementations used by the binary and the tests

pub mod capabilities;
pub mod mock;

pub use capabilities::{BleTransport, VoltageSource};
pub use mock::{MockAdc, MockBleTransport};
