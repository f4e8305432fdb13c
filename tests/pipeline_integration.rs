//! Pipeline integration tests
//!
//! Drives the sampler and processor against the simulated headset.
//!
//! # Test Coverage
//!
//! - Lockstep sampling/processing of the default synthetic EEG (blink timing and count)
//! - Attention tracking of the alpha rhythm
//! - Degraded acquisition: raw fallback and full ADC outage
//! - Full-state reset between runs
//!
//! Lockstep means one `sample_once()` followed by one `step()`, which removes scheduler jitter
//! so counts can be asserted exactly.

use eeg_daq::config::SimulationConfig;
use eeg_daq::constants::{ALPHA_WINDOW_SAMPLES, BUFFER_SIZE};
use eeg_daq::hardware::mock::MockAdc;
use eeg_daq::metrics::MetricsSnapshot;
use eeg_daq::pipeline::{AcquisitionMode, Pipeline, ProcessedSample, Processor, Sampler};
use std::sync::Arc;

// =============================================================================
// Test Helper Functions
// =============================================================================

/// Default synthetic EEG without noise: 1.5 mV alpha at 10 Hz, a 30 mV half-sine blink over
/// 10 samples at the start of every 100.
fn noiseless_adc() -> Arc<MockAdc> {
    Arc::new(MockAdc::new(
        SimulationConfig {
            noise_mv: 0.0,
            ..SimulationConfig::default()
        },
        7,
    ))
}

fn lockstep(
    pipeline: &Pipeline,
    adc: Arc<MockAdc>,
) -> (Sampler<MockAdc>, Processor) {
    (pipeline.sampler(adc), pipeline.processor())
}

async fn run_lockstep(
    sampler: &mut Sampler<MockAdc>,
    processor: &mut Processor,
    steps: usize,
) -> Vec<ProcessedSample> {
    let mut results = Vec::with_capacity(steps);
    for _ in 0..steps {
        sampler.sample_once().await;
        results.push(processor.step());
    }
    results
}

// =============================================================================
// Detection
// =============================================================================

#[tokio::test]
async fn test_one_blink_per_artefact() {
    let pipeline = Pipeline::new();
    let (mut sampler, mut processor) = lockstep(&pipeline, noiseless_adc());

    let results = run_lockstep(&mut sampler, &mut processor, 400).await;

    let blink_steps: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.blink.is_some())
        .map(|(n, _)| n)
        .collect();
    // Each artefact fires on its first rising sample and nowhere else.
    assert_eq!(blink_steps, vec![1, 101, 201, 301]);
    assert_eq!(pipeline.metrics().blink_count(), 4);
}

#[tokio::test]
async fn test_attention_refreshed_every_window() {
    let pipeline = Pipeline::new();
    let (mut sampler, mut processor) = lockstep(&pipeline, noiseless_adc());

    let results = run_lockstep(&mut sampler, &mut processor, 400).await;

    let updates: Vec<(usize, u8)> = results
        .iter()
        .enumerate()
        .filter_map(|(n, r)| r.attention.map(|a| (n, a)))
        .collect();
    assert_eq!(updates.len(), 400 / ALPHA_WINDOW_SAMPLES);
    for (i, (step, _)) in updates.iter().enumerate() {
        assert_eq!(*step, (i + 1) * ALPHA_WINDOW_SAMPLES - 1);
    }

    let (_, last) = updates[updates.len() - 1];
    assert!(last > 0);
    assert_eq!(pipeline.metrics().attention_level(), last);
}

#[tokio::test]
async fn test_stronger_alpha_raises_attention() {
    async fn attention_for(alpha_amplitude_mv: f64) -> u8 {
        let adc = Arc::new(MockAdc::new(
            SimulationConfig {
                alpha_amplitude_mv,
                noise_mv: 0.0,
                blink_amplitude_mv: 0.0,
                ..SimulationConfig::default()
            },
            1,
        ));
        let pipeline = Pipeline::new();
        let (mut sampler, mut processor) = lockstep(&pipeline, adc);
        run_lockstep(&mut sampler, &mut processor, 2 * BUFFER_SIZE).await;
        pipeline.metrics().attention_level()
    }

    let weak = attention_for(0.5).await;
    let strong = attention_for(2.0).await;
    assert!(strong > weak, "strong {strong} <= weak {weak}");
}

// =============================================================================
// Degraded Acquisition
// =============================================================================

#[tokio::test]
async fn test_raw_fallback_keeps_sampling() {
    let adc = noiseless_adc();
    adc.set_calibration_available(false);
    let pipeline = Pipeline::new();
    let (mut sampler, mut processor) = lockstep(&pipeline, Arc::clone(&adc));

    run_lockstep(&mut sampler, &mut processor, 120).await;

    assert_eq!(sampler.mode(), AcquisitionMode::Raw);
    assert_eq!(adc.samples_produced(), 120);
    assert_eq!(pipeline.buffer().cursor(), 120);
}

#[tokio::test]
async fn test_outage_leaves_metrics_stale() {
    let adc = noiseless_adc();
    let pipeline = Pipeline::new();
    let (mut sampler, mut processor) = lockstep(&pipeline, Arc::clone(&adc));

    run_lockstep(&mut sampler, &mut processor, 250).await;
    let before = pipeline.metrics().snapshot();
    let cursor = pipeline.buffer().cursor();
    assert_eq!(before.blink_count, 3);

    adc.set_offline(true);
    run_lockstep(&mut sampler, &mut processor, 150).await;

    assert_eq!(sampler.mode(), AcquisitionMode::Offline);
    assert_eq!(pipeline.buffer().cursor(), cursor);
    assert_eq!(pipeline.metrics().snapshot(), before);

    // Recovery resumes the stream where the converter left off.
    adc.set_offline(false);
    run_lockstep(&mut sampler, &mut processor, 1).await;
    assert_eq!(sampler.mode(), AcquisitionMode::Calibrated);
    assert_eq!(pipeline.buffer().cursor(), (cursor + 1) % BUFFER_SIZE);
}

// =============================================================================
// Reset
// =============================================================================

#[tokio::test]
async fn test_reset_between_runs_reproduces_first_run() {
    let pipeline = Pipeline::new();
    let (mut sampler, mut processor) = lockstep(&pipeline, noiseless_adc());
    let first = run_lockstep(&mut sampler, &mut processor, 150).await;

    processor.reset_buffer_state().unwrap();
    assert_eq!(pipeline.metrics().snapshot(), MetricsSnapshot::default());
    assert_eq!(pipeline.buffer().cursor(), 0);
    assert_eq!(pipeline.buffer().snapshot_as_window(), [0; BUFFER_SIZE]);

    // A fresh converter replays the same signal into the reset pipeline.
    let mut sampler = pipeline.sampler(noiseless_adc());
    let second = run_lockstep(&mut sampler, &mut processor, 150).await;

    assert_eq!(first, second);
}
