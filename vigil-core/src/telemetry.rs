//! Telemetry port
//!
//! The pipeline is fire-and-forget: triggers acknowledge before the work
//! runs, so failures cannot surface through return values. Everything the
//! pipeline swallows goes through this port instead.

use std::sync::Arc;
use tracing::error;

/// Sink for failures the pipeline does not raise to its caller
pub trait Telemetry: Send + Sync {
    /// Record an unexpected failure within the named scope
    fn capture_error(&self, scope: &str, message: &str);

    /// Record a noteworthy event that is not a failure
    fn capture_message(&self, message: &str);
}

/// Shared handle to a telemetry sink
pub type SharedTelemetry = Arc<dyn Telemetry>;

/// Default sink: structured log output
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn capture_error(&self, scope: &str, message: &str) {
        error!(scope, "{}", message);
    }

    fn capture_message(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Convenience constructor for the default sink
pub fn log_telemetry() -> SharedTelemetry {
    Arc::new(LogTelemetry)
}
