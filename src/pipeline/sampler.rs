//! Producer task: one ADC reading per sample period into the ring buffer.

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace, warn};

use crate::constants::SAMPLE_PERIOD;
use crate::data::ring_buffer::RingBuffer;
use crate::data::sample::{sample_from_millivolts, Sample};
use crate::error::DaqError;
use crate::hardware::capabilities::VoltageSource;

/// Which read path produced the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Calibrated millivolts.
    Calibrated,
    /// Calibration unavailable; raw counts used as-is.
    Raw,
    /// Neither path answered; nothing is pushed.
    Offline,
}

/// Periodic ADC sampler.
///
/// The only writer of the ring buffer. A failed cycle never aborts the task: calibration loss
/// degrades to the raw reading, a full outage skips the push so downstream metrics stay stale.
/// Mode changes are logged once, not once per sample.
pub struct Sampler<S: ?Sized> {
    source: Arc<S>,
    buffer: Arc<RingBuffer>,
    mode: AcquisitionMode,
}

impl<S> Sampler<S>
where
    S: VoltageSource + ?Sized,
{
    /// Sampler writing readings from `source` into `buffer`.
    pub fn new(source: Arc<S>, buffer: Arc<RingBuffer>) -> Self {
        Self {
            source,
            buffer,
            mode: AcquisitionMode::Calibrated,
        }
    }

    /// Read path used by the most recent cycle.
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    /// Run one acquisition cycle. Returns the pushed sample, or `None` if the ADC was unreachable.
    pub async fn sample_once(&mut self) -> Option<Sample> {
        let millivolts = match self.source.read_calibrated_voltage().await {
            Ok(mv) => {
                if self.mode != AcquisitionMode::Calibrated {
                    info!(previous = ?self.mode, "Calibrated acquisition restored");
                    self.mode = AcquisitionMode::Calibrated;
                }
                mv
            }
            Err(calibration_err) => match self.source.read_raw().await {
                Ok(counts) => {
                    if self.mode != AcquisitionMode::Raw {
                        warn!(
                            error = %calibration_err,
                            "Calibration unavailable, falling back to raw ADC readings"
                        );
                        self.mode = AcquisitionMode::Raw;
                    }
                    // Raw counts are taken at face value.
                    f64::from(counts)
                }
                Err(raw_err) => {
                    if self.mode != AcquisitionMode::Offline {
                        let error = DaqError::Acquisition(format!("{raw_err:#}"));
                        warn!(
                            %error,
                            "ADC unreachable, skipping samples until it recovers"
                        );
                        self.mode = AcquisitionMode::Offline;
                    }
                    return None;
                }
            },
        };

        let sample = sample_from_millivolts(millivolts);
        self.buffer.push(sample);
        trace!(sample, millivolts, "Sample acquired");
        Some(sample)
    }

    /// Sample every [`SAMPLE_PERIOD`] until the task is aborted.
    pub async fn run(mut self) {
        let mut ticker = interval(SAMPLE_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.sample_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::hardware::mock::MockAdc;

    fn flat_adc(baseline_mv: f64) -> Arc<MockAdc> {
        Arc::new(MockAdc::new(
            SimulationConfig {
                baseline_mv,
                alpha_amplitude_mv: 0.0,
                noise_mv: 0.0,
                blink_amplitude_mv: 0.0,
                ..SimulationConfig::default()
            },
            1,
        ))
    }

    #[tokio::test]
    async fn test_calibrated_reading_scaled_and_pushed() {
        let buffer = Arc::new(RingBuffer::new());
        let mut sampler = Sampler::new(flat_adc(12.5), Arc::clone(&buffer));

        assert_eq!(sampler.sample_once().await, Some(125));
        assert_eq!(buffer.latest(), 125);
        assert_eq!(buffer.cursor(), 1);
        assert_eq!(sampler.mode(), AcquisitionMode::Calibrated);
    }

    #[tokio::test]
    async fn test_falls_back_to_raw_when_uncalibrated() {
        let adc = flat_adc(33.0);
        adc.set_calibration_available(false);
        let buffer = Arc::new(RingBuffer::new());
        let mut sampler = Sampler::new(Arc::clone(&adc), Arc::clone(&buffer));

        // 33 mV -> 40 counts -> 400 units.
        assert_eq!(sampler.sample_once().await, Some(400));
        assert_eq!(sampler.mode(), AcquisitionMode::Raw);

        adc.set_calibration_available(true);
        assert_eq!(sampler.sample_once().await, Some(330));
        assert_eq!(sampler.mode(), AcquisitionMode::Calibrated);
    }

    #[tokio::test]
    async fn test_outage_skips_push() {
        let adc = flat_adc(10.0);
        let buffer = Arc::new(RingBuffer::new());
        let mut sampler = Sampler::new(Arc::clone(&adc), Arc::clone(&buffer));

        sampler.sample_once().await;
        adc.set_offline(true);
        assert_eq!(sampler.sample_once().await, None);
        assert_eq!(sampler.mode(), AcquisitionMode::Offline);
        assert_eq!(buffer.cursor(), 1);
        assert_eq!(buffer.latest(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_once_per_period() {
        let buffer = Arc::new(RingBuffer::new());
        let sampler = Sampler::new(flat_adc(1.0), Arc::clone(&buffer));

        let task = tokio::spawn(sampler.run());
        // First tick fires immediately, then one per 10 ms.
        tokio::time::sleep(SAMPLE_PERIOD * 10 + SAMPLE_PERIOD / 2).await;
        task.abort();

        assert_eq!(buffer.cursor(), 11);
    }
}
