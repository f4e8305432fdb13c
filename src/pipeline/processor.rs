//! Consumer task: filter, blink detection and windowed attention scoring.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::constants::{ALPHA_WINDOW_SAMPLES, SAMPLE_PERIOD};
use crate::data::blink::{BlinkDetector, BlinkEvent};
use crate::data::goertzel::AlphaEstimator;
use crate::data::iir_filter::BandpassFilter;
use crate::data::ring_buffer::RingBuffer;
use crate::data::sample::{sample_to_millivolts, Sample};
use crate::metrics::MetricsStore;

/// Result of one processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedSample {
    /// Newest buffer sample as read.
    pub raw: Sample,
    /// Bandpass output.
    pub filtered: Sample,
    /// Blink fired on this sample.
    pub blink: Option<BlinkEvent>,
    /// Attention score, on the steps that complete a window.
    pub attention: Option<u8>,
}

/// Periodic consumer of the ring buffer.
///
/// Owns the filter history and detector state outright; only the buffer and the metrics are
/// shared. The buffer lock is held just long enough to copy the latest sample (or a window)
/// out, never across filtering or detection.
#[derive(Debug)]
pub struct Processor {
    buffer: Arc<RingBuffer>,
    metrics: Arc<MetricsStore>,
    filter: BandpassFilter,
    detector: BlinkDetector,
    estimator: AlphaEstimator,
    window_counter: usize,
    #[cfg_attr(not(any(test, feature = "test-support")), allow(dead_code))]
    tasks_running: Arc<AtomicBool>,
}

impl Processor {
    /// Processor reading `buffer` and publishing into `metrics`.
    pub fn new(buffer: Arc<RingBuffer>, metrics: Arc<MetricsStore>) -> Self {
        Self {
            buffer,
            metrics,
            filter: BandpassFilter::new(),
            detector: BlinkDetector::new(),
            estimator: AlphaEstimator::new(),
            window_counter: 0,
            tasks_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share the pipeline's running flag, which guards the full reset.
    pub(crate) fn with_running_flag(mut self, tasks_running: Arc<AtomicBool>) -> Self {
        self.tasks_running = tasks_running;
        self
    }

    /// Samples processed since the last attention update.
    pub fn window_counter(&self) -> usize {
        self.window_counter
    }

    /// Blink detector state.
    pub fn detector(&self) -> &BlinkDetector {
        &self.detector
    }

    /// Process the newest buffered sample.
    pub fn step(&mut self) -> ProcessedSample {
        let raw = self.buffer.latest();
        let filtered = self.filter.apply(raw);

        let blink = self.detector.update(filtered);
        if let Some(event) = blink {
            let blink_count = self.metrics.record_blink();
            info!(
                blink_count,
                derivative = event.derivative,
                millivolts = sample_to_millivolts(event.sample),
                "Blink detected"
            );
        }

        self.window_counter += 1;
        let attention = if self.window_counter >= ALPHA_WINDOW_SAMPLES {
            self.window_counter = 0;
            let window = self.buffer.snapshot_as_window();
            let score = self.estimator.score(&window);
            self.metrics.set_attention_level(score);
            debug!(attention_level = score, "Attention updated");
            Some(score)
        } else {
            None
        };

        trace!(raw, filtered, "Sample processed");
        ProcessedSample {
            raw,
            filtered,
            blink,
            attention,
        }
    }

    /// Process one sample every [`SAMPLE_PERIOD`] until the task is aborted.
    ///
    /// Not synchronised with the sampler: under jitter a sample may be processed twice or
    /// skipped.
    pub async fn run(mut self) {
        let mut ticker = interval(SAMPLE_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.step();
        }
    }

    /// Full-state reset: buffer contents and cursor, both metrics, filter history, detector
    /// and window counter all return to their initial values.
    ///
    /// Test builds only. Refused with [`DaqError::PipelineRunning`] while the pipeline this
    /// processor came from has spawned tasks that are not shut down.
    ///
    /// [`DaqError::PipelineRunning`]: crate::error::DaqError::PipelineRunning
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset_buffer_state(&mut self) -> crate::error::AppResult<()> {
        if self
            .tasks_running
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(crate::error::DaqError::PipelineRunning);
        }
        self.buffer.reset();
        self.metrics.reset();
        self.detector.reset();
        self.window_counter = 0;
        self.reset_filter_state();
        Ok(())
    }

    /// Zero the bandpass filter history only. Test builds only.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset_filter_state(&mut self) {
        self.filter.reset();
    }
}
