//! Mock Hardware Implementations
//!
//! Simulated devices for running the pipeline without the headset.
//!
//! # Available Mocks
//!
//! - `MockAdc` - Synthetic EEG front-end with switchable calibration and outage
//! - `MockBleTransport` - GATT peripheral stack that completes every action immediately
//!
//! # Signal Model
//!
//! For sample index `n` at `SAMPLE_RATE_HZ`:
//!
//! ```text
//! v[n] = baseline + A_alpha·sin(2π·f_alpha·n/fs) + blink(n) + U(-noise, noise)
//! blink(n) = A_blink·sin(π·k/L)   for k = n mod P < L, else 0
//! ```
//!
//! where `P` and `L` are the blink interval and duration in samples. Noise comes from a seeded
//! `StdRng`, so a given configuration always produces the same stream.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::config::{AcquisitionConfig, SimulationConfig};
use crate::constants::SAMPLE_RATE_HZ;
use crate::hardware::capabilities::{BleTransport, VoltageSource};
use crate::notify::gatt::{GattAction, GattEvent};

/// Full-scale input of the simulated 12-bit converter.
pub const ADC_FULL_SCALE_MV: f64 = 3300.0;
/// Largest raw conversion result.
pub const ADC_MAX_COUNTS: i32 = 4095;

/// Convert millivolts to raw counts on a straight line through 0 and full scale.
pub fn millivolts_to_counts(millivolts: f64) -> i32 {
    let counts = millivolts * f64::from(ADC_MAX_COUNTS) / ADC_FULL_SCALE_MV;
    counts.clamp(0.0, f64::from(ADC_MAX_COUNTS)) as i32
}

fn duration_in_samples(duration: Duration) -> u64 {
    (duration.as_secs_f64() * SAMPLE_RATE_HZ).round() as u64
}

// =============================================================================
// MockAdc - Simulated EEG Front-End
// =============================================================================

struct SignalState {
    rng: StdRng,
    sample_index: u64,
}

/// Simulated single-channel ADC producing synthetic EEG.
///
/// Every successful read advances the signal by one sample. Failed reads do not.
///
/// # Example
///
/// ```rust,ignore
/// let adc = MockAdc::new(SimulationConfig::default(), 7);
/// let mv = adc.read_calibrated_voltage().await?;
/// adc.set_calibration_available(false);
/// assert!(adc.read_calibrated_voltage().await.is_err());
/// ```
pub struct MockAdc {
    signal: SimulationConfig,
    blink_period: u64,
    blink_length: u64,
    calibration_available: AtomicBool,
    online: AtomicBool,
    state: Mutex<SignalState>,
}

impl MockAdc {
    /// Create a simulated ADC with calibration available.
    pub fn new(signal: SimulationConfig, seed: u64) -> Self {
        let blink_period = duration_in_samples(signal.blink_interval).max(1);
        let blink_length = duration_in_samples(signal.blink_duration).max(1);
        Self {
            signal,
            blink_period,
            blink_length,
            calibration_available: AtomicBool::new(true),
            online: AtomicBool::new(true),
            state: Mutex::new(SignalState {
                rng: StdRng::seed_from_u64(seed),
                sample_index: 0,
            }),
        }
    }

    /// Create from loaded configuration.
    pub fn from_config(acquisition: &AcquisitionConfig, signal: &SimulationConfig) -> Self {
        let adc = Self::new(signal.clone(), acquisition.seed);
        adc.set_calibration_available(acquisition.calibration_enabled);
        adc
    }

    /// Make calibrated reads succeed or fail.
    pub fn set_calibration_available(&self, available: bool) {
        self.calibration_available.store(available, Ordering::SeqCst);
    }

    /// Simulate a complete converter outage (both read paths fail).
    pub fn set_offline(&self, offline: bool) {
        self.online.store(!offline, Ordering::SeqCst);
    }

    /// Number of samples produced so far.
    pub fn samples_produced(&self) -> u64 {
        self.state.lock().sample_index
    }

    /// Noise-free signal value at sample `n`, in millivolts.
    pub fn ideal_millivolts(&self, n: u64) -> f64 {
        let t = n as f64 / SAMPLE_RATE_HZ;
        let alpha =
            self.signal.alpha_amplitude_mv * (2.0 * PI * self.signal.alpha_frequency_hz * t).sin();

        let phase = n % self.blink_period;
        let blink = if phase < self.blink_length {
            self.signal.blink_amplitude_mv * (PI * phase as f64 / self.blink_length as f64).sin()
        } else {
            0.0
        };

        self.signal.baseline_mv + alpha + blink
    }

    fn next_millivolts(&self) -> f64 {
        let mut state = self.state.lock();
        let n = state.sample_index;
        state.sample_index += 1;

        let noise = if self.signal.noise_mv > 0.0 {
            state
                .rng
                .gen_range(-self.signal.noise_mv..=self.signal.noise_mv)
        } else {
            0.0
        };
        self.ideal_millivolts(n) + noise
    }
}

impl Default for MockAdc {
    fn default() -> Self {
        Self::from_config(&AcquisitionConfig::default(), &SimulationConfig::default())
    }
}

#[async_trait]
impl VoltageSource for MockAdc {
    async fn read_calibrated_voltage(&self) -> Result<f64> {
        if !self.online.load(Ordering::SeqCst) {
            bail!("ADC offline");
        }
        if !self.calibration_available.load(Ordering::SeqCst) {
            bail!("ADC calibration unavailable");
        }
        Ok(self.next_millivolts())
    }

    async fn read_raw(&self) -> Result<i32> {
        if !self.online.load(Ordering::SeqCst) {
            bail!("ADC offline");
        }
        Ok(millivolts_to_counts(self.next_millivolts()))
    }
}

// =============================================================================
// MockBleTransport - Simulated GATT Peripheral Stack
// =============================================================================

/// Interface number handed out at registration.
const MOCK_GATT_INTERFACE: u8 = 3;
/// First attribute handle handed out.
const FIRST_HANDLE: u16 = 40;

/// A notification accepted by [`MockBleTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Connection the notification was addressed to.
    pub conn_id: u16,
    /// Characteristic value handle.
    pub attr_handle: u16,
    /// Encoded value.
    pub payload: Bytes,
}

/// Simulated BLE stack.
///
/// Each [`GattAction`] completes immediately with the matching [`GattEvent`], delivered on the
/// channel returned by [`MockBleTransport::new`]. Attribute handles are allocated the way a
/// typical stack does it: one for the service, two per characteristic (declaration + value).
pub struct MockBleTransport {
    events: mpsc::UnboundedSender<GattEvent>,
    auto_connect: bool,
    next_handle: AtomicU16,
    next_conn_id: AtomicU16,
    fail_notifications: AtomicBool,
    notifications: Mutex<Vec<SentNotification>>,
}

impl MockBleTransport {
    /// Create the stack and the receiver for its completion events.
    ///
    /// With `auto_connect`, a peer connects as soon as advertising starts.
    pub fn new(auto_connect: bool) -> (Self, mpsc::UnboundedReceiver<GattEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let transport = Self {
            events,
            auto_connect,
            next_handle: AtomicU16::new(FIRST_HANDLE),
            next_conn_id: AtomicU16::new(0),
            fail_notifications: AtomicBool::new(false),
            notifications: Mutex::new(Vec::new()),
        };
        (transport, rx)
    }

    /// Register the application with the stack, starting bring-up.
    pub fn register_app(&self) -> Result<()> {
        self.emit(GattEvent::Registered {
            interface: MOCK_GATT_INTERFACE,
        })
    }

    /// Simulate a peer connecting. Returns its connection id.
    pub fn connect(&self) -> Result<u16> {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        self.emit(GattEvent::Connected { conn_id })?;
        Ok(conn_id)
    }

    /// Simulate the peer going away.
    pub fn disconnect(&self, conn_id: u16) -> Result<()> {
        self.emit(GattEvent::Disconnected { conn_id })
    }

    /// Make subsequent notifications fail (congestion, no peer subscription).
    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Every notification accepted so far, in order.
    pub fn notifications(&self) -> Vec<SentNotification> {
        self.notifications.lock().clone()
    }

    fn emit(&self, event: GattEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| anyhow!("GATT event receiver dropped"))
    }

    fn allocate(&self, count: u16) -> u16 {
        self.next_handle.fetch_add(count, Ordering::SeqCst)
    }
}

#[async_trait]
impl BleTransport for MockBleTransport {
    async fn execute(&self, action: GattAction) -> Result<()> {
        match action {
            GattAction::CreateService { .. } => self.emit(GattEvent::ServiceCreated {
                service_handle: self.allocate(1),
            }),
            GattAction::AddCharacteristic { uuid, .. } => {
                let declaration = self.allocate(2);
                self.emit(GattEvent::CharacteristicAdded {
                    uuid,
                    attr_handle: declaration + 1,
                })
            }
            GattAction::StartService { .. } => {
                self.emit(GattEvent::ServiceStarted { success: true })
            }
            GattAction::StartAdvertising => {
                self.emit(GattEvent::AdvertisingStarted { success: true })?;
                if self.auto_connect {
                    self.connect()?;
                }
                Ok(())
            }
        }
    }

    async fn notify(&self, conn_id: u16, attr_handle: u16, payload: Bytes) -> Result<()> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            bail!("notification rejected by stack");
        }
        self.notifications
            .lock()
            .push(SentNotification {
                conn_id,
                attr_handle,
                payload,
            });
        Ok(())
    }
}
