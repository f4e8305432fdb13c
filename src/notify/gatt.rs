//! GATT service bring-up.
//!
//! The wireless stack completes each setup step asynchronously and reports back with an event.
//! [`GattServer`] turns that callback sequence into an explicit state machine:
//!
//! ```text
//! Registering ──ServiceCreated──▶ ServiceCreated ──CharacteristicAdded×2──▶
//!     CharacteristicsAdded ──ServiceStarted──▶ Started
//! ```
//!
//! Every accepted event yields the [`GattAction`]s the stack must perform next. Events that do
//! not fit the current state are rejected with [`DaqError::Gatt`] and leave the state untouched.
//!
//! Once `Started`, connection events are tracked and published on a `watch` channel as a
//! [`NotifyTarget`], which is all the metrics notifier needs.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::error::{AppResult, DaqError};
use crate::hardware::capabilities::BleTransport;

/// Primary service UUID (16-bit).
pub const SERVICE_UUID: u16 = 0x180A;
/// Blink count characteristic UUID.
pub const CHAR_UUID_BLINK_COUNT: u16 = 0x2A56;
/// Attention level characteristic UUID.
pub const CHAR_UUID_ATTENTION_LEVEL: u16 = 0x2A57;
/// Attribute handles reserved for the service.
pub const SERVICE_NUM_HANDLES: u16 = 8;

/// Characteristic property flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharProperties {
    /// Peer may read the value.
    pub read: bool,
    /// Peer may write the value.
    pub write: bool,
    /// Value changes are pushed to the peer.
    pub notify: bool,
}

impl CharProperties {
    /// Read + notify, used by both metric characteristics.
    pub const READ_NOTIFY: Self = Self {
        read: true,
        write: false,
        notify: true,
    };
}

/// A step the wireless stack must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattAction {
    /// Create the primary service.
    CreateService {
        /// Service UUID.
        uuid: u16,
        /// Number of attribute handles to reserve.
        num_handles: u16,
    },
    /// Add a characteristic to a created service.
    AddCharacteristic {
        /// Handle of the owning service.
        service_handle: u16,
        /// Characteristic UUID.
        uuid: u16,
        /// Property flags.
        properties: CharProperties,
    },
    /// Start the service.
    StartService {
        /// Handle of the service to start.
        service_handle: u16,
    },
    /// Begin (or resume) advertising.
    StartAdvertising,
}

/// Completion callback from the wireless stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattEvent {
    /// The application was registered with the stack.
    Registered {
        /// Interface assigned by the stack.
        interface: u8,
    },
    /// The service exists.
    ServiceCreated {
        /// Handle assigned to the service.
        service_handle: u16,
    },
    /// A characteristic was added.
    CharacteristicAdded {
        /// UUID of the added characteristic.
        uuid: u16,
        /// Attribute handle of its value.
        attr_handle: u16,
    },
    /// The service start attempt finished.
    ServiceStarted {
        /// Whether the stack reported success.
        success: bool,
    },
    /// Advertising start attempt finished.
    AdvertisingStarted {
        /// Whether the stack reported success.
        success: bool,
    },
    /// A peer connected.
    Connected {
        /// Connection identifier.
        conn_id: u16,
    },
    /// The peer disconnected.
    Disconnected {
        /// Connection identifier.
        conn_id: u16,
    },
}

/// Attribute handles of the two metric characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicHandles {
    /// Blink count value handle.
    pub blink_count: u16,
    /// Attention level value handle.
    pub attention_level: u16,
}

/// Bring-up state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Waiting for registration and service creation.
    Registering,
    /// Service exists; characteristics are being added.
    ServiceCreated {
        /// Service handle.
        service_handle: u16,
        /// Blink characteristic handle, once added.
        blink_count: Option<u16>,
    },
    /// Both characteristics added; service start pending.
    CharacteristicsAdded {
        /// Service handle.
        service_handle: u16,
        /// Characteristic handles.
        handles: CharacteristicHandles,
    },
    /// Service running; notifications possible once a peer connects.
    Started {
        /// Service handle.
        service_handle: u16,
        /// Characteristic handles.
        handles: CharacteristicHandles,
    },
}

/// Where notifications go: the live connection and the characteristic handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyTarget {
    /// Connection identifier.
    pub conn_id: u16,
    /// Characteristic handles.
    pub handles: CharacteristicHandles,
}

/// GATT bring-up state machine and connection tracker.
#[derive(Debug)]
pub struct GattServer {
    state: ServiceState,
    interface: Option<u8>,
    connection: Option<u16>,
    target_tx: watch::Sender<Option<NotifyTarget>>,
}

impl GattServer {
    /// New server in `Registering`, with no connection.
    pub fn new() -> Self {
        let (target_tx, _) = watch::channel(None);
        Self {
            state: ServiceState::Registering,
            interface: None,
            connection: None,
            target_tx,
        }
    }

    /// Receiver that sees the notify target whenever it appears, changes or goes away.
    pub fn subscribe(&self) -> watch::Receiver<Option<NotifyTarget>> {
        self.target_tx.subscribe()
    }

    /// Current bring-up state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Active connection, if any.
    pub fn connection(&self) -> Option<u16> {
        self.connection
    }

    /// Interface assigned at registration.
    pub fn interface(&self) -> Option<u8> {
        self.interface
    }

    /// Current notify target: `Some` only when started and connected.
    pub fn target(&self) -> Option<NotifyTarget> {
        match (self.state, self.connection) {
            (ServiceState::Started { handles, .. }, Some(conn_id)) => {
                Some(NotifyTarget { conn_id, handles })
            }
            _ => None,
        }
    }

    /// Apply one stack event and return the actions to perform next.
    pub fn handle_event(&mut self, event: GattEvent) -> AppResult<Vec<GattAction>> {
        let (next, actions) = self.transition(event)?;
        self.state = next;

        let target = self.target();
        self.target_tx.send_if_modified(|current| {
            if *current == target {
                false
            } else {
                *current = target;
                true
            }
        });

        Ok(actions)
    }

    fn transition(&mut self, event: GattEvent) -> AppResult<(ServiceState, Vec<GattAction>)> {
        use ServiceState as S;

        let state = self.state;
        match (state, event) {
            (S::Registering, GattEvent::Registered { interface }) if self.interface.is_none() => {
                info!(interface, "GATT application registered, creating service");
                self.interface = Some(interface);
                Ok((
                    state,
                    vec![GattAction::CreateService {
                        uuid: SERVICE_UUID,
                        num_handles: SERVICE_NUM_HANDLES,
                    }],
                ))
            }
            (S::Registering, GattEvent::ServiceCreated { service_handle })
                if self.interface.is_some() =>
            {
                info!(service_handle, "Service created, adding blink count characteristic");
                Ok((
                    S::ServiceCreated {
                        service_handle,
                        blink_count: None,
                    },
                    vec![GattAction::AddCharacteristic {
                        service_handle,
                        uuid: CHAR_UUID_BLINK_COUNT,
                        properties: CharProperties::READ_NOTIFY,
                    }],
                ))
            }
            (
                S::ServiceCreated {
                    service_handle,
                    blink_count: None,
                },
                GattEvent::CharacteristicAdded {
                    uuid: CHAR_UUID_BLINK_COUNT,
                    attr_handle,
                },
            ) => {
                info!(attr_handle, "Blink count characteristic added");
                Ok((
                    S::ServiceCreated {
                        service_handle,
                        blink_count: Some(attr_handle),
                    },
                    vec![GattAction::AddCharacteristic {
                        service_handle,
                        uuid: CHAR_UUID_ATTENTION_LEVEL,
                        properties: CharProperties::READ_NOTIFY,
                    }],
                ))
            }
            (
                S::ServiceCreated {
                    service_handle,
                    blink_count: Some(blink_count),
                },
                GattEvent::CharacteristicAdded {
                    uuid: CHAR_UUID_ATTENTION_LEVEL,
                    attr_handle,
                },
            ) => {
                info!(attr_handle, "Attention level characteristic added, starting service");
                Ok((
                    S::CharacteristicsAdded {
                        service_handle,
                        handles: CharacteristicHandles {
                            blink_count,
                            attention_level: attr_handle,
                        },
                    },
                    vec![GattAction::StartService { service_handle }],
                ))
            }
            (
                S::CharacteristicsAdded {
                    service_handle,
                    handles,
                },
                GattEvent::ServiceStarted { success: true },
            ) => {
                info!(service_handle, "Service started, advertising");
                Ok((
                    S::Started {
                        service_handle,
                        handles,
                    },
                    vec![GattAction::StartAdvertising],
                ))
            }
            (S::CharacteristicsAdded { .. }, GattEvent::ServiceStarted { success: false }) => {
                Err(DaqError::Gatt("stack failed to start the service".into()))
            }
            (_, GattEvent::AdvertisingStarted { success }) => {
                if success {
                    info!("Advertising started");
                } else {
                    warn!("Advertising failed to start");
                }
                Ok((state, Vec::new()))
            }
            (_, GattEvent::Connected { conn_id }) => {
                info!(conn_id, "Peer connected");
                self.connection = Some(conn_id);
                Ok((state, Vec::new()))
            }
            (_, GattEvent::Disconnected { conn_id }) if self.connection != Some(conn_id) => {
                warn!(
                    conn_id,
                    active = ?self.connection,
                    "Ignoring disconnect for a connection that is not active"
                );
                Ok((state, Vec::new()))
            }
            (_, GattEvent::Disconnected { conn_id }) => {
                info!(conn_id, "Peer disconnected");
                self.connection = None;
                let actions = if matches!(state, S::Started { .. }) {
                    vec![GattAction::StartAdvertising]
                } else {
                    Vec::new()
                };
                Ok((state, actions))
            }
            (state, event) => Err(DaqError::Gatt(format!(
                "unexpected {event:?} while {state:?}"
            ))),
        }
    }
}

impl Default for GattServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed stack events into `server` and execute the resulting actions until the event
/// channel closes.
///
/// Rejected events and failed actions are logged and skipped. An unrecoverable error stops
/// the driver.
pub async fn drive<T>(
    mut server: GattServer,
    mut events: mpsc::UnboundedReceiver<GattEvent>,
    transport: Arc<T>,
) where
    T: BleTransport + ?Sized,
{
    while let Some(event) = events.recv().await {
        let actions = match server.handle_event(event) {
            Ok(actions) => actions,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Ignoring GATT event");
                continue;
            }
            Err(e) => {
                error!(error = %e, "GATT driver stopped");
                return;
            }
        };

        for action in actions {
            if let Err(e) = transport.execute(action).await {
                warn!(?action, error = %e, "GATT action failed");
            }
        }
    }
}
