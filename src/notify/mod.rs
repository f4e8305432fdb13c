//! Wireless metric publication.
//!
//! - [`gatt`]: service bring-up state machine and connection tracking
//! - [`notifier`]: periodic, change-driven characteristic notifications

pub mod gatt;
pub mod notifier;

pub use gatt::{GattAction, GattEvent, GattServer, NotifyTarget, ServiceState};
pub use notifier::{
    encode_attention_level, encode_blink_count, Delivered, MetricsNotifier, PollOutcome,
};
