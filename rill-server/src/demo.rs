//! Demo producer: synthetic series for trying the endpoint without wiring
//! up a real application.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rill::{Registry, Result, Series};

/// Name of the sine wave series.
pub const SINE: &str = "demo.sine";

/// Name of the sawtooth series.
pub const SAWTOOTH: &str = "demo.sawtooth";

/// Samples per waveform period.
const PERIOD: u32 = 60;

/// Registers the demo series, sized to retain `window` at `interval`.
///
/// # Errors
///
/// Returns [`rill::RillError::AlreadyExists`] if a demo series is already
/// registered.
pub fn register(
    registry: &Registry,
    window: Duration,
    interval: Duration,
) -> Result<(Arc<Series>, Arc<Series>)> {
    let sine = registry.create_for_window(SINE, window, interval)?;
    let sawtooth = registry.create_for_window(SAWTOOTH, window, interval)?;
    Ok((sine, sawtooth))
}

/// Value of each demo waveform at `tick`.
pub fn waveforms(tick: u64) -> (f64, f64) {
    let phase = f64::from(u32::try_from(tick % u64::from(PERIOD)).unwrap_or(0)) / f64::from(PERIOD);
    let sine = 50.0 + 50.0 * (phase * std::f64::consts::TAU).sin();
    let sawtooth = 100.0 * phase;
    (sine, sawtooth)
}

/// Spawns a thread that appends one stamped-now sample to each demo series
/// every `interval`, forever.
///
/// # Errors
///
/// Returns [`rill::RillError::AlreadyExists`] if a demo series is already
/// registered.
pub fn spawn_producer(
    registry: &Registry,
    window: Duration,
    interval: Duration,
) -> Result<JoinHandle<()>> {
    let (sine, sawtooth) = register(registry, window, interval)?;
    tracing::info!(
        capacity = sine.capacity(),
        ?interval,
        "demo producer feeding {SINE} and {SAWTOOTH}"
    );

    Ok(thread::spawn(move || {
        for tick in 0u64.. {
            let (s, t) = waveforms(tick);
            sine.append(s);
            sawtooth.append(t);
            thread::sleep(interval);
        }
    }))
}
