//! # Uplinq Telemetry
//!
//! Structured logging setup plus the audit side channel.
//!
//! Logging is strictly an observer of business operations: an audit or log
//! failure must never change the outcome of the operation it observes.
//! [`AuditSink::record`] is therefore infallible from the caller's point
//! of view; sinks swallow and log their own failures.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `UPLINQ_LOG_LEVEL` | `info` | Log level filter |
//! | `UPLINQ_SERVICE_NAME` | `uplinq` | Service name on log lines |

mod audit;
mod config;

pub use audit::{AuditEvent, AuditSink, NullAuditSink, TracingAuditSink};
pub use config::TelemetryConfig;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize subscriber: {0}")]
    SubscriberInit(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Install the global tracing subscriber.
///
/// Returns a guard to hold for the lifetime of the process. Safe to call
/// once; a second call reports `SubscriberInit`.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(TelemetryGuard { _private: () })
}

/// Guard that keeps telemetry active for the process lifetime.
pub struct TelemetryGuard {
    _private: (),
}
