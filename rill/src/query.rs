//! Range selection and decimation for series queries.
//!
//! These are the pure stages of [`Series::query`](crate::series::Series::query).
//! The series buffer is responsible for locking and for presenting its slots
//! in chronological order; everything after that happens here:
//!
//! 1. [`select_range`] keeps samples strictly inside `(from, to)` and converts
//!    them to millisecond [`DataPoint`]s.
//! 2. [`decimate`] thins the selection down to at most `max_points` entries by
//!    picking evenly spaced indices.
//!
//! # Example
//!
//! ```rust
//! use rill::query::{decimate, select_range};
//! use rill::Sample;
//!
//! let samples = [
//!     Sample::new(1.0, 1_000_000),
//!     Sample::new(2.0, 2_000_000),
//!     Sample::new(3.0, 3_000_000),
//!     Sample::new(4.0, 4_000_000),
//! ];
//!
//! let selected = select_range(samples.iter().copied(), 0, 5_000_000);
//! let thinned = decimate(selected, 2);
//! assert_eq!(thinned.len(), 2);
//! assert_eq!(thinned[0].value, 1.0);
//! assert_eq!(thinned[1].value, 3.0);
//! ```

use crate::sample::{DataPoint, Sample};

/// Collects the samples whose timestamps lie strictly between `from_ns` and
/// `to_ns`, preserving input order.
///
/// Both bounds are exclusive: a sample stamped exactly `from_ns` or `to_ns`
/// is dropped. An inverted range (`to_ns <= from_ns`) selects nothing.
pub fn select_range<I>(samples: I, from_ns: u64, to_ns: u64) -> Vec<DataPoint>
where
    I: IntoIterator<Item = Sample>,
{
    samples
        .into_iter()
        .filter(|s| s.timestamp_ns > from_ns && s.timestamp_ns < to_ns)
        .map(Sample::to_data_point)
        .collect()
}

/// Reduces `points` to at most `max_points` entries by even decimation.
///
/// When there are more points than allowed, output index `i` takes source
/// index `floor(i * len / max_points)`. The first point is always kept; the
/// last one is not guaranteed. A selection that already fits is returned
/// unchanged.
///
/// `max_points == 0` returns an empty vector. Callers that want "no limit"
/// must translate that themselves.
#[allow(clippy::cast_precision_loss)] // point counts are far below 2^52
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // floor of a value in [0, len)
pub fn decimate(points: Vec<DataPoint>, max_points: usize) -> Vec<DataPoint> {
    if points.len() <= max_points {
        return points;
    }

    let ratio = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| points[(i as f64 * ratio) as usize])
        .collect()
}
