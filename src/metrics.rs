//! Externally observable pipeline outputs.
//!
//! The processor is the only writer; the notifier (and anything else) only reads. Each
//! field is an independent atomic of its own word size, so readers never see a torn value.
//! No consistency is promised across the two fields.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use serde::Serialize;

use crate::constants::ATTENTION_MAX;

/// Blink count and attention level shared between the processor and the notifier.
#[derive(Debug, Default)]
pub struct MetricsStore {
    blink_count: AtomicU32,
    attention_level: AtomicU8,
}

/// Point-in-time copy of the metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Blinks detected since start (or last reset).
    pub blink_count: u32,
    /// Latest attention score in `[0, 100]`.
    pub attention_level: u8,
}

impl MetricsStore {
    /// Both metrics at zero.
    pub const fn new() -> Self {
        Self {
            blink_count: AtomicU32::new(0),
            attention_level: AtomicU8::new(0),
        }
    }

    /// Count one blink and return the new total. Saturates at `u32::MAX`.
    pub fn record_blink(&self) -> u32 {
        let previous = self
            .blink_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                Some(count.saturating_add(1))
            })
            .unwrap_or_else(|count| count);
        previous.saturating_add(1)
    }

    /// Store a new attention score, clamped to `[0, ATTENTION_MAX]`.
    pub fn set_attention_level(&self, level: u8) {
        self.attention_level
            .store(level.min(ATTENTION_MAX), Ordering::Relaxed);
    }

    /// Current blink count.
    pub fn blink_count(&self) -> u32 {
        self.blink_count.load(Ordering::Relaxed)
    }

    /// Current attention score.
    pub fn attention_level(&self) -> u8 {
        self.attention_level.load(Ordering::Relaxed)
    }

    /// Read both fields.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blink_count: self.blink_count(),
            attention_level: self.attention_level(),
        }
    }

    /// Zero both fields. Test builds only.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.blink_count.store(0, Ordering::Relaxed);
        self.attention_level.store(0, Ordering::Relaxed);
    }
}
