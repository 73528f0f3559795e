//! Application configuration loaded from environment variables.

/// Runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `SAGA_SLA_SECS` — seconds before an in-flight saga counts as stuck (default: `30`)
/// - `MONITOR_INTERVAL_SECS` — how often the stuck-saga monitor sweeps (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub saga_sla_secs: u64,
    pub monitor_interval_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            saga_sla_secs: std::env::var("SAGA_SLA_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            monitor_interval_secs: std::env::var("MONITOR_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            saga_sla_secs: 30,
            monitor_interval_secs: 10,
        }
    }
}
