//! Name-to-series registry.
//!
//! The [`Registry`] binds unique series names to shared [`Series`] buffers.
//! It is an ordinary value: construct one at startup and hand an
//! `Arc<Registry>` to every producer and to the query endpoint.
//!
//! # Lifecycle
//!
//! Each name moves between two states:
//!
//! - `absent → bound` via [`Registry::create`]
//! - `bound → absent` via [`Registry::delete`]
//!
//! Rebinding a name always goes through `absent`; `create` never replaces an
//! existing series.
//!
//! # Locking
//!
//! The map lock is held only for the lookup, insert, or removal itself. It is
//! never held while a series' own lock is taken, so registry calls and series
//! calls can interleave freely across threads.
//!
//! # Example
//!
//! ```rust
//! use rill::{Registry, RillError};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), RillError> {
//! let registry = Registry::new();
//!
//! let cpu = registry.create_for_window(
//!     "cpu.usage",
//!     Duration::from_secs(300),
//!     Duration::from_secs(1),
//! )?;
//! cpu.append(42.0);
//!
//! // Query handlers look the series up by name.
//! let same = registry.get("cpu.usage")?;
//! assert_eq!(same.len(), 1);
//!
//! assert!(matches!(
//!     registry.create("cpu.usage", 10),
//!     Err(RillError::AlreadyExists { .. })
//! ));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Result, RillError};
use crate::series::{Series, SeriesStats, capacity_for};

/// Concurrent mapping from series name to series buffer.
#[derive(Debug, Default)]
pub struct Registry {
    series: Mutex<HashMap<String, Arc<Series>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new series with room for `capacity` samples.
    ///
    /// When several threads race to create the same name, exactly one
    /// succeeds and the rest get [`RillError::AlreadyExists`].
    ///
    /// # Errors
    ///
    /// Returns [`RillError::AlreadyExists`] if `name` is already bound. The
    /// existing series is left untouched.
    pub fn create(&self, name: &str, capacity: usize) -> Result<Arc<Series>> {
        let mut series = self.series.lock();
        match series.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RillError::AlreadyExists {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let created = Arc::new(Series::new(capacity));
                slot.insert(Arc::clone(&created));
                tracing::debug!(series = name, capacity, "created series");
                Ok(created)
            }
        }
    }

    /// Registers a new series sized to retain `window` worth of samples
    /// taken every `interval`.
    ///
    /// See [`capacity_for`] for the sizing rule.
    ///
    /// # Errors
    ///
    /// Returns [`RillError::AlreadyExists`] if `name` is already bound.
    pub fn create_for_window(
        &self,
        name: &str,
        window: Duration,
        interval: Duration,
    ) -> Result<Arc<Series>> {
        self.create(name, capacity_for(window, interval))
    }

    /// Looks up the series bound to `name`.
    ///
    /// The returned handle shares the buffer with every other holder.
    ///
    /// # Errors
    ///
    /// Returns [`RillError::NotFound`] if `name` is not bound.
    pub fn get(&self, name: &str) -> Result<Arc<Series>> {
        self.series
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RillError::NotFound {
                name: name.to_string(),
            })
    }

    /// Unbinds `name` and discards its samples.
    ///
    /// Handles obtained earlier through [`Registry::get`] stay usable but are
    /// detached: writes to them are no longer visible through the registry.
    /// Callers should drop them.
    ///
    /// # Errors
    ///
    /// Returns [`RillError::NotFound`] if `name` is not bound.
    pub fn delete(&self, name: &str) -> Result<()> {
        match self.series.lock().remove(name) {
            Some(_) => {
                tracing::debug!(series = name, "deleted series");
                Ok(())
            }
            None => Err(RillError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Returns all bound names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.series.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the stats of every bound series, sorted by name.
    ///
    /// Takes a snapshot of the map first and reads each series afterwards,
    /// so a series created or deleted concurrently may or may not appear.
    pub fn stats(&self) -> Vec<(String, SeriesStats)> {
        let mut snapshot: Vec<(String, Arc<Series>)> = self
            .series
            .lock()
            .iter()
            .map(|(name, series)| (name.clone(), Arc::clone(series)))
            .collect();
        snapshot.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        snapshot
            .into_iter()
            .map(|(name, series)| (name, series.stats()))
            .collect()
    }

    /// Returns the number of bound series.
    pub fn len(&self) -> usize {
        self.series.lock().len()
    }

    /// Returns `true` if no series is bound.
    pub fn is_empty(&self) -> bool {
        self.series.lock().is_empty()
    }
}
