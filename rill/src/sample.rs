//! Sample and data point types.
//!
//! A [`Sample`] is what producers write: a value and a nanosecond timestamp.
//! A [`DataPoint`] is what queries return: the same value with the timestamp
//! reduced to milliseconds, which is the resolution dashboard clients expect.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::{Serialize, Serializer};

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// A single recorded value and the instant it was recorded at.
///
/// Timestamps are nanoseconds since the Unix epoch. Samples are `Copy` and
/// never modified after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// The recorded value.
    pub value: f64,
    /// Nanoseconds since the Unix epoch.
    pub timestamp_ns: u64,
}

impl Sample {
    /// Creates a sample from a value and a nanosecond timestamp.
    pub fn new(value: f64, timestamp_ns: u64) -> Self {
        Self {
            value,
            timestamp_ns,
        }
    }

    /// Creates a sample stamped with the current wall-clock time.
    pub fn now(value: f64) -> Self {
        Self::new(value, now_ns())
    }

    /// Converts this sample into a millisecond-resolution data point.
    #[inline]
    pub fn to_data_point(self) -> DataPoint {
        DataPoint {
            value: self.value,
            timestamp_ms: self.timestamp_ns / NANOS_PER_MILLI,
        }
    }
}

/// A query result entry: a value paired with its timestamp in milliseconds.
///
/// Serializes as a two-element array `[value, timestamp_ms]`, the framing
/// SimpleJSON dashboard clients expect for datapoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// The recorded value.
    pub value: f64,
    /// Milliseconds since the Unix epoch (truncated from nanoseconds).
    pub timestamp_ms: u64,
}

impl Serialize for DataPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.value, self.timestamp_ms).serialize(serializer)
    }
}

/// Returns the current wall-clock time in nanoseconds since the Unix epoch.
///
/// A clock set before 1970 reads as 0.
#[allow(clippy::cast_possible_truncation)] // u64 nanoseconds cover dates until 2554
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
