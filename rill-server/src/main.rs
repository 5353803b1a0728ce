//! rill-server binary: parse configuration, set up logging, optionally start
//! the demo producer, then serve dashboard queries until killed.

use std::sync::Arc;

use clap::Parser;
use rill::Registry;
use rill_server::{Datasource, ServerConfig, api, demo};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    if let Err(e) = run(&config) {
        tracing::error!("server failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(Registry::new());

    if config.demo {
        let _producer = demo::spawn_producer(&registry, config.demo_window, config.demo_interval)?;
    }

    api::run_api_server(&config.addr(), Datasource::new(registry))?;

    tracing::info!("server exited cleanly");
    Ok(())
}
