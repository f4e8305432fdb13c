//! Fixed-capacity circular sample buffer shared between the sampler and the processor.
//!
//! The buffer holds exactly [`BUFFER_SIZE`] samples and a write cursor. Writing at capacity
//! overwrites the oldest slot; the buffer never grows. It is the only piece of state shared
//! between the producer and the consumer, so every access goes through one mutex.
//!
//! # Layout
//! ```text
//! samples: [s0 s1 ... s255]   storage order, zero-initialised
//! cursor:  next slot to write, always in [0, BUFFER_SIZE)
//! latest:  samples[(cursor - 1) mod BUFFER_SIZE]
//! ```
//!
//! # Concurrency
//! - Critical sections copy at most one sample in or one window out; they never call back
//!   into user code and are never nested, so the lock cannot deadlock.
//! - No operation allocates: windows are returned as fixed-size arrays.
//! - `parking_lot::Mutex` does not poison. The state is valid after every critical section, so
//!   a panic elsewhere cannot leave a torn sample behind.

use parking_lot::Mutex;

use crate::constants::BUFFER_SIZE;
use crate::data::sample::Sample;

/// A full-buffer copy, as handed to the spectral estimator.
pub type Window = [Sample; BUFFER_SIZE];

struct RingState {
    samples: Window,
    cursor: usize,
}

impl RingState {
    const fn zeroed() -> Self {
        Self {
            samples: [0; BUFFER_SIZE],
            cursor: 0,
        }
    }

    fn latest_index(&self) -> usize {
        (self.cursor + BUFFER_SIZE - 1) % BUFFER_SIZE
    }
}

/// Mutex-guarded circular buffer of [`Sample`]s.
pub struct RingBuffer {
    state: Mutex<RingState>,
}

impl RingBuffer {
    /// Create a zero-filled buffer with the cursor at 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RingState::zeroed()),
        }
    }

    /// Write a sample at the cursor and advance it, overwriting the oldest slot when full.
    pub fn push(&self, sample: Sample) {
        let mut state = self.state.lock();
        let cursor = state.cursor;
        state.samples[cursor] = sample;
        state.cursor = (cursor + 1) % BUFFER_SIZE;
    }

    /// Most recently written sample. Returns 0 before the first push.
    pub fn latest(&self) -> Sample {
        let state = self.state.lock();
        state.samples[state.latest_index()]
    }

    /// Copy of the whole backing array in storage order (not chronological).
    ///
    /// The alpha estimator consumes band power, not timing relative to "now", so the
    /// rotation of the window does not matter to it.
    pub fn snapshot_as_window(&self) -> Window {
        self.state.lock().samples
    }

    /// Copy of the buffer ordered oldest to newest.
    pub fn chronological(&self) -> Window {
        let state = self.state.lock();
        let mut ordered = [0; BUFFER_SIZE];
        let (newer, older) = state.samples.split_at(state.cursor);
        ordered[..older.len()].copy_from_slice(older);
        ordered[older.len()..].copy_from_slice(newer);
        ordered
    }

    /// Index of the next slot to be written.
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    /// Number of sample slots.
    pub const fn capacity(&self) -> usize {
        BUFFER_SIZE
    }

    /// Zero every slot and move the cursor back to 0.
    ///
    /// Test builds only; no sampler may be running.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        *self.state.lock() = RingState::zeroed();
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &BUFFER_SIZE)
            .field("cursor", &state.cursor)
            .field("latest", &state.samples[state.latest_index()])
            .finish()
    }
}
