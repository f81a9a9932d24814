//! Telemetry configuration.

/// Configuration for the tracing subscriber.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// An `EnvFilter` directive string, e.g. `info` or `uplinq=debug`.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "uplinq".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("UPLINQ_SERVICE_NAME")
                .unwrap_or(defaults.service_name),
            log_level: std::env::var("UPLINQ_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}
