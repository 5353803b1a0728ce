//! # rill
//!
//! In-memory ring-buffer time series for live dashboard panels.
//!
//! rill keeps the last N samples of each named series in a fixed-size,
//! thread-safe ring buffer and answers range queries with a bounded number of
//! points, which is exactly what a dashboard polling every few seconds needs.
//! Nothing is persisted; memory use is fixed by the capacities you choose.
//!
//! ## Key Properties
//!
//! - Fixed capacity per series, oldest samples overwritten first
//! - Wall-clock appends stay chronological; out-of-order appends are sorted
//!   lazily by the next query
//! - Range queries exclude both bounds and decimate evenly to `max_points`
//! - Registry and series are independently locked; no global state
//!
//! ## Quick Start
//!
//! ```rust
//! use rill::Registry;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), rill::RillError> {
//! let registry = Arc::new(Registry::new());
//!
//! // Keep 5 minutes of 1-second samples.
//! let cpu = registry.create_for_window(
//!     "cpu.usage",
//!     Duration::from_secs(300),
//!     Duration::from_secs(1),
//! )?;
//!
//! cpu.append(85.5);
//! cpu.append_at(86.0, 1_700_000_000_000_000_000);
//!
//! // Serve a dashboard request: everything, at most 100 points.
//! let points = registry.get("cpu.usage")?.query(0, u64::MAX, 100);
//! for point in &points {
//!     println!("{} @ {}ms", point.value, point.timestamp_ms);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`registry`] — Name-to-series binding
//! - [`series`] — Ring buffer, capacity sizing
//! - [`query`] — Range selection and decimation
//! - [`sample`] — Sample and data point types
//! - [`error`] — Error types

pub mod error;
pub mod query;
pub mod registry;
pub mod sample;
pub mod series;

// Re-export primary API types at crate root for convenience.
pub use error::{Result, RillError};
pub use registry::Registry;
pub use sample::{DataPoint, Sample, now_ns};
pub use series::{Series, SeriesStats, capacity_for};
