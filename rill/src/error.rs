//! Error types for the rill time-series core.
//!
//! The core has exactly two failure modes, both raised by the
//! [`Registry`](crate::registry::Registry) and both expected during normal
//! operation (e.g. setup code probing for a series before creating it).
//! Buffer operations never fail: malformed query bounds produce an empty or
//! degenerate result instead of an error.

use thiserror::Error;

/// The main error type for all rill operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RillError {
    /// A series with this name is already registered.
    #[error("series '{name}' already exists")]
    AlreadyExists {
        /// The conflicting series name.
        name: String,
    },

    /// No series with this name is registered.
    #[error("no such series: '{name}'")]
    NotFound {
        /// The series name that was looked up.
        name: String,
    },
}

impl RillError {
    /// Returns the series name the error refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::AlreadyExists { name } | Self::NotFound { name } => name,
        }
    }
}

/// Type alias for `Result<T, RillError>`.
pub type Result<T> = std::result::Result<T, RillError>;
