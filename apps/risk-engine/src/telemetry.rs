//! Tracing setup.
//!
//! Installs a `tracing-subscriber` fmt subscriber. The filter comes from
//! `RUST_LOG` when set, otherwise from `observability.logging.level`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use risk_engine::telemetry::init_telemetry;
//!
//! fn main() {
//!     init_telemetry(&config.observability);
//!     // ... application code
//! }
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Initialize console tracing.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place and return `false`.
pub fn init_telemetry(config: &ObservabilityConfig) -> bool {
    let logging = &config.logging;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let installed = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(logging.include_target)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(logging.include_target)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(level = %logging.level, format = ?logging.format, "Tracing initialized");
    }
    installed
}
