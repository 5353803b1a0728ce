//! Fixed-capacity ring buffer for a single time series.
//!
//! A [`Series`] holds the most recent `capacity` samples written to it. When
//! the buffer is full every new sample overwrites the oldest one. The buffer
//! owns its own lock, so an `Arc<Series>` can be shared freely between
//! producer threads and query handlers.
//!
//! # Design
//!
//! - Slots fill up in insertion order; `head` is the next slot to write and
//!   wraps modulo `capacity`.
//! - Once the buffer has wrapped, the oldest sample sits at `head`; before
//!   that, it sits at slot 0.
//! - Writes stamped with "now" are chronological by construction. Writes that
//!   carry an explicit timestamp mark the buffer unsorted, and the next query
//!   sorts the slots in place before reading. Queries that follow without an
//!   intervening explicit-timestamp write skip the sort.
//!
//! There is no reader/writer split: a query may reorder slots, so reads and
//! writes take the same exclusive lock.
//!
//! # Example
//!
//! ```rust
//! use rill::series::Series;
//!
//! let series = Series::new(3);
//! series.append_at(1.0, 1_000_000);
//! series.append_at(2.0, 2_000_000);
//! series.append_at(3.0, 3_000_000);
//! series.append_at(4.0, 4_000_000); // overwrites 1.0
//!
//! let points = series.query(0, u64::MAX, 10);
//! let values: Vec<f64> = points.iter().map(|p| p.value).collect();
//! assert_eq!(values, vec![2.0, 3.0, 4.0]);
//! ```

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::query::{decimate, select_range};
use crate::sample::{DataPoint, NANOS_PER_MILLI, Sample};

/// Computes the buffer capacity needed to retain `window` worth of samples
/// taken every `interval`.
///
/// Returns `ceil(window / interval)`, or 1 when `interval >= window` (which
/// also covers a zero window or zero interval). Saturates at `usize::MAX`.
///
/// # Examples
///
/// ```rust
/// use rill::series::capacity_for;
/// use std::time::Duration;
///
/// assert_eq!(capacity_for(Duration::from_secs(300), Duration::from_secs(10)), 30);
/// assert_eq!(capacity_for(Duration::from_secs(10), Duration::from_secs(3)), 4);
/// assert_eq!(capacity_for(Duration::from_secs(1), Duration::from_secs(5)), 1);
/// ```
pub fn capacity_for(window: Duration, interval: Duration) -> usize {
    if interval.is_zero() || interval >= window {
        return 1;
    }
    usize::try_from(window.as_nanos().div_ceil(interval.as_nanos())).unwrap_or(usize::MAX)
}

/// A point-in-time summary of a series buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesStats {
    /// Number of slots holding a sample.
    pub len: usize,
    /// Fixed number of slots.
    pub capacity: usize,
    /// Timestamp of the oldest sample, in milliseconds.
    pub oldest_ms: Option<u64>,
    /// Timestamp of the newest sample, in milliseconds.
    pub newest_ms: Option<u64>,
    /// Whether the next query will have to sort the slots.
    pub sort_pending: bool,
    /// How many lazy sorts have run over the buffer's lifetime.
    pub sorts: u64,
}

/// A named series' sample buffer, safe to share across threads.
///
/// Obtain one from [`Registry::create`](crate::registry::Registry::create) or
/// build one standalone with [`Series::new`].
#[derive(Debug)]
pub struct Series {
    ring: Mutex<Ring>,
}

impl Series {
    /// Creates an empty series that retains up to `capacity` samples.
    ///
    /// A capacity of 0 is raised to 1 so the ring always has a slot to write.
    ///
    /// # Panics
    ///
    /// Storage for all `capacity` slots is reserved up front, so this panics
    /// (or aborts) if that allocation is impossible.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring::new(capacity.max(1))),
        }
    }

    /// Returns the fixed number of slots.
    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity
    }

    /// Returns the number of samples currently held.
    pub fn len(&self) -> usize {
        self.ring.lock().slots.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.ring.lock().slots.is_empty()
    }

    /// Appends `value` stamped with the current wall-clock time.
    ///
    /// The wall clock is assumed to be non-decreasing between calls, so this
    /// path never triggers a re-sort.
    pub fn append(&self, value: f64) {
        let mut ring = self.ring.lock();
        ring.push(Sample::now(value));
    }

    /// Appends `value` with an explicit timestamp in nanoseconds.
    ///
    /// The timestamp may be older than what is already stored. The buffer is
    /// marked unsorted regardless, and the next query pays for a sort.
    pub fn append_at(&self, value: f64, timestamp_ns: u64) {
        self.append_sample(Sample::new(value, timestamp_ns));
    }

    /// Appends a pre-built sample. Same ordering rules as [`Series::append_at`].
    pub fn append_sample(&self, sample: Sample) {
        let mut ring = self.ring.lock();
        ring.unsorted = true;
        ring.push(sample);
    }

    /// Appends `samples` in order as one atomic batch.
    ///
    /// No other reader or writer observes a partially applied batch. A batch
    /// longer than the capacity leaves only its last `capacity` samples.
    pub fn append_batch(&self, samples: &[Sample]) {
        if samples.is_empty() {
            return;
        }

        let mut ring = self.ring.lock();
        ring.unsorted = true;
        for &sample in samples {
            ring.push(sample);
        }
    }

    /// Returns the samples stamped strictly between `from_ns` and `to_ns`, in
    /// chronological order, thinned to at most `max_points` entries.
    ///
    /// Both bounds are exclusive. When more than `max_points` samples fall in
    /// range they are decimated evenly; the first in-range sample is always
    /// kept.
    ///
    /// Inputs are not validated: an inverted range yields an empty vector and
    /// `max_points == 0` yields an empty vector. Callers that need stricter
    /// behavior must check at their boundary.
    pub fn query(&self, from_ns: u64, to_ns: u64, max_points: usize) -> Vec<DataPoint> {
        let selected = {
            let mut ring = self.ring.lock();
            ring.sort_if_needed();
            select_range(ring.chronological(), from_ns, to_ns)
        };

        decimate(selected, max_points)
    }

    /// Returns every stored sample, oldest first, with no filtering.
    pub fn fetch_all(&self) -> Vec<Sample> {
        let mut ring = self.ring.lock();
        ring.sort_if_needed();
        ring.chronological().collect()
    }

    /// Returns a summary of the buffer without sorting it.
    pub fn stats(&self) -> SeriesStats {
        let ring = self.ring.lock();
        let (oldest, newest) = if ring.unsorted {
            let stamps = ring.slots.iter().map(|s| s.timestamp_ns);
            (stamps.clone().min(), stamps.max())
        } else {
            let mut stamps = ring.chronological().map(|s| s.timestamp_ns);
            let oldest = stamps.next();
            (oldest, stamps.last().or(oldest))
        };

        SeriesStats {
            len: ring.slots.len(),
            capacity: ring.capacity,
            oldest_ms: oldest.map(|ns| ns / NANOS_PER_MILLI),
            newest_ms: newest.map(|ns| ns / NANOS_PER_MILLI),
            sort_pending: ring.unsorted,
            sorts: ring.sorts,
        }
    }
}

/// Lock-protected ring state.
///
/// `slots` grows by push until it reaches `capacity` and is then written in
/// place, so `slots.len()` is always `min(writes, capacity)`.
#[derive(Debug)]
struct Ring {
    slots: Vec<Sample>,
    capacity: usize,
    /// Next slot to write. Always in `[0, capacity)`.
    head: usize,
    /// Set by explicit-timestamp writes, cleared by a sort.
    unsorted: bool,
    sorts: u64,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            unsorted: false,
            sorts: 0,
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    #[inline]
    fn push(&mut self, sample: Sample) {
        if self.is_full() {
            self.slots[self.head] = sample;
        } else {
            self.slots.push(sample);
        }
        self.head = (self.head + 1) % self.capacity;
    }

    /// Sorts the valid slots by timestamp and rebases the ring so the oldest
    /// sample is at slot 0. No-op when nothing out of order was written.
    fn sort_if_needed(&mut self) {
        if !self.unsorted {
            return;
        }

        self.slots.sort_by_key(|s| s.timestamp_ns);
        self.head = self.slots.len() % self.capacity;
        self.unsorted = false;
        self.sorts += 1;
        tracing::debug!(len = self.slots.len(), "sorted series buffer");
    }

    /// Iterates the valid slots from oldest to newest write position.
    fn chronological(&self) -> impl Iterator<Item = Sample> + '_ {
        let start = if self.is_full() { self.head } else { 0 };
        let (newer, older) = self.slots.split_at(start);
        older.iter().chain(newer).copied()
    }
}
