//! Ring buffer concurrency tests
//!
//! A writer thread pushes values from a small recognizable set while reader threads call
//! `latest()` and take full-window snapshots. Any value outside the set would mean a reader
//! saw a partially written sample.

use eeg_daq::constants::BUFFER_SIZE;
use eeg_daq::data::ring_buffer::RingBuffer;
use eeg_daq::data::Sample;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

/// Bit patterns that differ in both bytes, so a torn read cannot land on another member.
const PATTERN: [Sample; 4] = [0x1234, -0x2B3C, 0x7E01, -0x0180];
/// Pre-fill value, also legal to observe.
const FILL: Sample = 0x5A5A;

fn is_known(value: Sample) -> bool {
    value == FILL || PATTERN.contains(&value)
}

#[test]
fn test_concurrent_push_and_read_never_tear() {
    let buffer = Arc::new(RingBuffer::new());
    for _ in 0..BUFFER_SIZE {
        buffer.push(FILL);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let start = Arc::new(Barrier::new(3));

    let writer = {
        let buffer = Arc::clone(&buffer);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            for n in 0..200_000usize {
                buffer.push(PATTERN[n % PATTERN.len()]);
            }
        })
    };

    let latest_reader = {
        let buffer = Arc::clone(&buffer);
        let stop = Arc::clone(&stop);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            let mut reads = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let value = buffer.latest();
                assert!(is_known(value), "torn latest(): {value:#06x}");
                reads += 1;
            }
            reads
        })
    };

    start.wait();
    let mut snapshots = 0u64;
    while !writer.is_finished() {
        let window = buffer.snapshot_as_window();
        for value in window {
            assert!(is_known(value), "torn snapshot value: {value:#06x}");
        }
        snapshots += 1;
    }

    writer.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    let reads = latest_reader.join().unwrap();

    assert!(reads > 0);
    assert!(snapshots > 0);
    // 200_000 pushes after a full pre-fill: cursor lands on 200_000 mod capacity.
    assert_eq!(buffer.cursor(), 200_000 % BUFFER_SIZE);
}

#[test]
fn test_wrap_invariant_keeps_last_capacity_values() {
    let buffer = RingBuffer::new();
    let total = 3 * BUFFER_SIZE + 17;

    for n in 0..total {
        buffer.push(n as Sample);
    }

    assert_eq!(buffer.cursor(), total % BUFFER_SIZE);
    assert_eq!(buffer.latest(), (total - 1) as Sample);

    let chronological = buffer.chronological();
    let expected: Vec<Sample> = ((total - BUFFER_SIZE)..total).map(|n| n as Sample).collect();
    assert_eq!(chronological.as_slice(), expected.as_slice());

    // Storage order is the same set of values rotated by the cursor.
    let mut storage = buffer.snapshot_as_window();
    storage.rotate_left(buffer.cursor());
    assert_eq!(storage, chronological);
}
