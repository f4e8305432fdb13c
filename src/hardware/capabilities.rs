//! Hardware Capabilities
//!
//! The pipeline core talks to two external subsystems, each through one small capability
//! trait:
//!
//! - [`VoltageSource`]: the analog front-end and ADC, yielding one reading on demand
//! - [`BleTransport`]: the wireless stack, performing GATT bring-up actions and pushing
//!   notifications to a connected peer
//!
//! # Design Philosophy
//!
//! Each capability trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses anyhow::Result for errors
//! - Focuses on ONE thing
//!
//! The core never treats a capability error as fatal: acquisition errors degrade to the raw
//! reading or a skipped sample, notification errors are retried on the next poll.
//!
//! # Example
//!
//! ```rust,ignore
//! struct BenchSupply { millivolts: f64 }
//!
//! #[async_trait]
//! impl VoltageSource for BenchSupply {
//!     async fn read_calibrated_voltage(&self) -> Result<f64> {
//!         Ok(self.millivolts)
//!     }
//!
//!     async fn read_raw(&self) -> Result<i32> {
//!         Ok((self.millivolts * 4095.0 / 3300.0) as i32)
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::notify::gatt::GattAction;

/// Capability: Analog Voltage Readout
///
/// A single analog channel sampled on demand.
///
/// # Contract
/// - `read_calibrated_voltage()` returns millivolts after the device's calibration curve
/// - `read_raw()` returns the uncalibrated conversion result in device counts
/// - Calibration may be unavailable while raw reads still work; callers fall back
/// - One call per sample period; reads must be fast relative to the period
#[async_trait]
pub trait VoltageSource: Send + Sync {
    /// Read the channel and convert to millivolts using the calibration curve.
    ///
    /// # Returns
    /// - Ok(millivolts) on success
    /// - Err if calibration is unavailable or the conversion failed
    async fn read_calibrated_voltage(&self) -> Result<f64>;

    /// Read the uncalibrated conversion result.
    ///
    /// # Returns
    /// - Ok(counts) on success
    /// - Err if the converter itself is unreachable
    async fn read_raw(&self) -> Result<i32>;
}

/// Capability: BLE GATT Peripheral
///
/// The wireless stack as seen by the metrics notifier.
///
/// # Contract
/// - `execute()` starts one bring-up action; completion arrives later as a
///   [`GattEvent`](crate::notify::gatt::GattEvent) fed back into the
///   [`GattServer`](crate::notify::gatt::GattServer)
/// - `notify()` pushes a characteristic value to the connected peer; no delivery
///   guarantee or latency bound is assumed
#[async_trait]
pub trait BleTransport: Send + Sync {
    /// Ask the stack to perform a bring-up action.
    async fn execute(&self, action: GattAction) -> Result<()>;

    /// Send a notification for `attr_handle` to connection `conn_id`.
    async fn notify(&self, conn_id: u16, attr_handle: u16, payload: Bytes) -> Result<()>;
}
