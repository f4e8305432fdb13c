//! Acquisition pipeline wiring.
//!
//! ```text
//! VoltageSource ─▶ Sampler ─▶ RingBuffer ─▶ Processor ─┬─▶ BandpassFilter ─▶ BlinkDetector ─▶ blink_count
//!                                                      └─▶ AlphaEstimator(window) ────────▶ attention_level
//! ```
//!
//! [`Pipeline`] owns the two shared objects. The sampler and processor are independent tokio
//! tasks with their own 10 ms interval; they only meet at the buffer mutex and the metric
//! atomics. There is no cooperative shutdown: [`PipelineHandle::shutdown`] aborts both tasks
//! at their next await point, which is always a tick boundary.

pub mod processor;
pub mod sampler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::data::ring_buffer::RingBuffer;
use crate::hardware::capabilities::VoltageSource;
use crate::metrics::{MetricsSnapshot, MetricsStore};

pub use processor::{ProcessedSample, Processor};
pub use sampler::{AcquisitionMode, Sampler};

/// Shared state of one acquisition channel.
///
/// Clones share the same buffer, metrics and running flag.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    buffer: Arc<RingBuffer>,
    metrics: Arc<MetricsStore>,
    tasks_running: Arc<AtomicBool>,
}

impl Pipeline {
    /// Fresh, zeroed buffer and metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared ring buffer.
    pub fn buffer(&self) -> &Arc<RingBuffer> {
        &self.buffer
    }

    /// The shared metrics.
    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    /// A sampler writing into this pipeline's buffer.
    pub fn sampler<S>(&self, source: Arc<S>) -> Sampler<S>
    where
        S: VoltageSource + ?Sized,
    {
        Sampler::new(source, Arc::clone(&self.buffer))
    }

    /// A processor reading this pipeline's buffer and publishing its metrics.
    pub fn processor(&self) -> Processor {
        Processor::new(Arc::clone(&self.buffer), Arc::clone(&self.metrics))
            .with_running_flag(Arc::clone(&self.tasks_running))
    }

    /// Spawn the sampler and processor tasks on the current runtime.
    pub fn spawn<S>(&self, source: Arc<S>) -> PipelineHandle
    where
        S: VoltageSource + ?Sized + 'static,
    {
        self.tasks_running.store(true, Ordering::SeqCst);
        let sampler = tokio::spawn(self.sampler(source).run());
        let processor = tokio::spawn(self.processor().run());
        info!("Acquisition pipeline started");

        PipelineHandle {
            sampler,
            processor,
            metrics: Arc::clone(&self.metrics),
            tasks_running: Arc::clone(&self.tasks_running),
        }
    }
}

/// Running pipeline tasks.
#[derive(Debug)]
pub struct PipelineHandle {
    sampler: JoinHandle<()>,
    processor: JoinHandle<()>,
    metrics: Arc<MetricsStore>,
    tasks_running: Arc<AtomicBool>,
}

impl PipelineHandle {
    /// Current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whether both tasks are still running.
    pub fn is_running(&self) -> bool {
        !self.sampler.is_finished() && !self.processor.is_finished()
    }

    /// Stop both tasks and wait for them to wind down. Returns the final metrics.
    pub async fn shutdown(self) -> MetricsSnapshot {
        self.sampler.abort();
        self.processor.abort();
        // Aborted tasks resolve with a cancellation error, which is the expected outcome.
        let _ = self.sampler.await;
        let _ = self.processor.await;
        self.tasks_running.store(false, Ordering::SeqCst);

        let snapshot = self.metrics.snapshot();
        info!(
            blink_count = snapshot.blink_count,
            attention_level = snapshot.attention_level,
            "Acquisition pipeline stopped"
        );
        snapshot
    }
}
