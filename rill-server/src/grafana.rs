//! SimpleJSON data source protocol.
//!
//! Wire types for the requests Grafana's SimpleJSON data source sends, and
//! the [`Datasource`] that answers them from a shared [`Registry`].
//!
//! The data source issues:
//!
//! - `/search` to fill the metric picker with series names
//! - `/query` with a time range, a list of targets, and `maxDataPoints`
//! - `/annotations`, which we answer with an empty list
//!
//! Timeseries answers carry `datapoints` as `[value, ms]` pairs. Table
//! answers carry one `[ms, value]` row per point.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rill::{DataPoint, Registry, SeriesStats};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A `/query` request body. Fields the endpoint does not use are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// The panel's visible time window.
    pub range: TimeRange,
    /// Series to fetch.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Upper bound on points per target. Absent or non-positive means no limit.
    #[serde(default)]
    pub max_data_points: Option<i64>,
}

impl QueryRequest {
    /// Returns the per-target point limit the core should apply.
    pub fn point_limit(&self) -> usize {
        match self.max_data_points {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => usize::MAX,
        }
    }
}

/// Absolute query window, RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeRange {
    /// Window start (exclusive).
    pub from: DateTime<Utc>,
    /// Window end (exclusive).
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Returns the window as Unix nanoseconds.
    pub fn as_unix_ns(&self) -> (u64, u64) {
        (unix_ns(&self.from), unix_ns(&self.to))
    }
}

/// Clamps a timestamp into the `u64` nanosecond range the core uses.
fn unix_ns(at: &DateTime<Utc>) -> u64 {
    match at.timestamp_nanos_opt() {
        Some(ns) => u64::try_from(ns).unwrap_or(0),
        None if at.timestamp() < 0 => 0,
        None => u64::MAX,
    }
}

/// One requested series.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Series name.
    pub target: String,
    /// Grafana's query letter, echoed nowhere but useful in logs.
    #[serde(default)]
    pub ref_id: String,
    /// Response shape.
    #[serde(default, rename = "type")]
    pub kind: TargetKind,
}

/// The response shape a target asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TargetKind {
    /// `[{target, datapoints}]`
    #[default]
    #[serde(rename = "timeserie", alias = "timeseries")]
    Timeserie,
    /// `[{columns, rows, type: "table"}]`
    #[serde(rename = "table")]
    Table,
}

/// Answer for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetResponse {
    /// Points as `[value, ms]` pairs.
    Timeseries {
        /// Series name.
        target: String,
        /// Chronological, decimated points.
        datapoints: Vec<DataPoint>,
    },
    /// Points as `[ms, value]` rows.
    Table {
        /// Column headers.
        columns: Vec<Column>,
        /// One row per point.
        rows: Vec<(u64, f64)>,
        /// Always `"table"`.
        #[serde(rename = "type")]
        kind: &'static str,
    },
}

/// A table column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Header text.
    pub text: &'static str,
    /// Grafana column type.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Per-series summary for the `/series` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSummary {
    /// Series name.
    pub name: String,
    /// Buffer statistics.
    #[serde(flatten)]
    pub stats: SeriesStats,
}

/// Answers dashboard requests from a shared registry.
#[derive(Debug, Clone)]
pub struct Datasource {
    registry: Arc<Registry>,
}

impl Datasource {
    /// Wraps a registry shared with the producers.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Lists every series name for the metric picker.
    pub fn search(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Fetches each target's points inside the request window.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownSeries`](crate::error::ApiError::UnknownSeries)
    /// for the first target that is not registered.
    pub fn query(&self, request: &QueryRequest) -> Result<Vec<TargetResponse>> {
        let (from_ns, to_ns) = request.range.as_unix_ns();
        let limit = request.point_limit();

        request
            .targets
            .iter()
            .map(|target| -> Result<TargetResponse> {
                let series = self.registry.get(&target.target)?;
                let datapoints = series.query(from_ns, to_ns, limit);
                tracing::debug!(
                    series = %target.target,
                    ref_id = %target.ref_id,
                    points = datapoints.len(),
                    "serving target"
                );

                Ok(match target.kind {
                    TargetKind::Timeserie => TargetResponse::Timeseries {
                        target: target.target.clone(),
                        datapoints,
                    },
                    TargetKind::Table => table(&datapoints),
                })
            })
            .collect()
    }

    /// Returns stats for every registered series.
    pub fn series(&self) -> Vec<SeriesSummary> {
        self.registry
            .stats()
            .into_iter()
            .map(|(name, stats)| SeriesSummary { name, stats })
            .collect()
    }
}

fn table(points: &[DataPoint]) -> TargetResponse {
    TargetResponse::Table {
        columns: vec![
            Column {
                text: "Time",
                kind: "time",
            },
            Column {
                text: "Value",
                kind: "number",
            },
        ],
        rows: points.iter().map(|p| (p.timestamp_ms, p.value)).collect(),
        kind: "table",
    }
}
