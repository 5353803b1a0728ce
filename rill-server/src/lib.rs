//! # rill-server
//!
//! Serves [`rill`] time series to Grafana's SimpleJSON data source.
//!
//! The server owns nothing but a shared [`rill::Registry`]; producers write
//! into the same registry from their own threads.
//!
//! ```rust,no_run
//! use rill::Registry;
//! use rill_server::{api, grafana::Datasource};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::new());
//! let cpu = registry.create("cpu.usage", 300)?;
//!
//! std::thread::spawn(move || loop {
//!     cpu.append(42.0);
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! });
//!
//! api::run_api_server("0.0.0.0:3001", Datasource::new(registry))?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod demo;
pub mod error;
pub mod grafana;

pub use config::ServerConfig;
pub use error::{ApiError, Result};
pub use grafana::Datasource;
