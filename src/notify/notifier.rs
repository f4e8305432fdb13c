//! Change-driven metrics notifier.
//!
//! Polls [`MetricsStore`] at a fixed interval and pushes a characteristic notification for each
//! metric whose value differs from the last one successfully delivered to the current peer. A
//! newly connected peer receives both current values on the first poll. Nothing is sent until
//! the GATT service is started and a peer is connected.

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{AppResult, DaqError};
use crate::hardware::capabilities::BleTransport;
use crate::metrics::MetricsStore;
use crate::notify::gatt::NotifyTarget;

/// Blink count payload: 4 bytes, little-endian.
pub fn encode_blink_count(count: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_u32_le(count);
    buf.freeze()
}

/// Attention level payload: 1 byte.
pub fn encode_attention_level(level: u8) -> Bytes {
    Bytes::copy_from_slice(&[level])
}

/// What a single poll delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Blink count notification accepted by the transport.
    pub blink_sent: bool,
    /// Attention level notification accepted by the transport.
    pub attention_sent: bool,
}

/// Values delivered to one peer. Metric fields stay `None` until a send to that peer succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivered {
    /// Connection the values were delivered on.
    pub conn_id: Option<u16>,
    /// Last blink count delivered.
    pub blink_count: Option<u32>,
    /// Last attention level delivered.
    pub attention_level: Option<u8>,
}

/// Periodic notifier task.
pub struct MetricsNotifier<T: ?Sized> {
    metrics: Arc<MetricsStore>,
    transport: Arc<T>,
    target: watch::Receiver<Option<NotifyTarget>>,
    delivered: Delivered,
    poll_interval: Duration,
}

impl<T> MetricsNotifier<T>
where
    T: BleTransport + ?Sized,
{
    /// Build a notifier. `target` normally comes from [`GattServer::subscribe`].
    ///
    /// [`GattServer::subscribe`]: crate::notify::gatt::GattServer::subscribe
    pub fn new(
        metrics: Arc<MetricsStore>,
        transport: Arc<T>,
        target: watch::Receiver<Option<NotifyTarget>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            metrics,
            transport,
            target,
            delivered: Delivered::default(),
            poll_interval,
        }
    }

    /// Values last delivered to the current peer.
    pub fn delivered(&self) -> Delivered {
        self.delivered
    }

    /// Compare the store against the last delivered values and notify what changed.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        let target = *self.target.borrow();
        let Some(target) = target else {
            return outcome;
        };

        if self.delivered.conn_id != Some(target.conn_id) {
            debug!(conn_id = target.conn_id, "New peer, resending current metrics");
            self.delivered = Delivered {
                conn_id: Some(target.conn_id),
                ..Delivered::default()
            };
        }

        let current = self.metrics.snapshot();

        if self.delivered.blink_count != Some(current.blink_count) {
            let payload = encode_blink_count(current.blink_count);
            match self.send(target.conn_id, target.handles.blink_count, payload).await {
                Ok(()) => {
                    debug!(blink_count = current.blink_count, "Notified blink count");
                    self.delivered.blink_count = Some(current.blink_count);
                    outcome.blink_sent = true;
                }
                Err(e) => warn!(error = %e, "Blink count notification failed"),
            }
        }

        if self.delivered.attention_level != Some(current.attention_level) {
            let payload = encode_attention_level(current.attention_level);
            match self
                .send(target.conn_id, target.handles.attention_level, payload)
                .await
            {
                Ok(()) => {
                    debug!(
                        attention_level = current.attention_level,
                        "Notified attention level"
                    );
                    self.delivered.attention_level = Some(current.attention_level);
                    outcome.attention_sent = true;
                }
                Err(e) => warn!(error = %e, "Attention level notification failed"),
            }
        }

        outcome
    }

    async fn send(&self, conn_id: u16, attr_handle: u16, payload: Bytes) -> AppResult<()> {
        self.transport
            .notify(conn_id, attr_handle, payload)
            .await
            .map_err(|e| DaqError::Notification(format!("handle {attr_handle}: {e:#}")))
    }

    /// Poll forever at the configured interval.
    pub async fn run(mut self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}
