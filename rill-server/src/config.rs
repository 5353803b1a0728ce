//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;

/// rill-server — SimpleJSON endpoint for in-memory time series.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rill-server", version, about)]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "RILL_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "RILL_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Register demo series fed by a background producer.
    #[arg(long)]
    pub demo: bool,

    /// How much history each demo series retains (e.g. "30s", "5m", "1h").
    #[arg(long, default_value = "5m", value_parser = parse_duration)]
    pub demo_window: Duration,

    /// How often the demo producer appends (e.g. "1s").
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub demo_interval: Duration,
}

impl ServerConfig {
    /// Returns the `host:port` string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Parses a duration like `"500ms"`, `"30s"`, `"5m"`, `"1h"`, or `"7d"`.
///
/// # Errors
///
/// Returns a message naming the problem when the number or unit is invalid.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in duration '{s}': use ms, s, m, h, or d"))?;
    let (num_str, unit) = s.split_at(split);
    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration '{s}'"))?;

    let secs_per_unit = match unit {
        "ms" => return nonzero(Duration::from_millis(num), s),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return Err(format!("unknown duration unit '{unit}': use ms, s, m, h, or d")),
    };
    let secs = num
        .checked_mul(secs_per_unit)
        .ok_or_else(|| format!("duration '{s}' is too large"))?;

    nonzero(Duration::from_secs(secs), s)
}

fn nonzero(duration: Duration, s: &str) -> Result<Duration, String> {
    if duration.is_zero() {
        return Err(format!("duration '{s}' must be greater than zero"));
    }
    Ok(duration)
}
