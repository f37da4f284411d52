//! Metrics for modflow.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding program installs a recorder.
//!
//! ## Metrics
//!
//! ### Counters
//! - `modflow_executions_total` - Top-level executions by status
//! - `modflow_module_invocations_total` - Child invocations by module_type and status
//!
//! ### Histograms
//! - `modflow_execution_duration_seconds` - Top-level execution duration
//! - `modflow_module_duration_seconds` - Child invocation duration by module_type
//!
//! ### Gauges
//! - `modflow_active_executions` - Currently running top-level executions

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// =============================================================================
// Execution Metrics
// =============================================================================

/// Record a top-level execution.
pub fn record_execution(status: &str) {
    counter!(
        "modflow_executions_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record top-level execution duration.
pub fn record_execution_duration(duration: Duration) {
    histogram!("modflow_execution_duration_seconds").record(duration.as_secs_f64());
}

/// Increment active executions gauge.
pub fn inc_active_executions() {
    gauge!("modflow_active_executions").increment(1.0);
}

/// Decrement active executions gauge.
pub fn dec_active_executions() {
    gauge!("modflow_active_executions").decrement(1.0);
}

// =============================================================================
// Module Metrics
// =============================================================================

/// Record a child module invocation.
pub fn record_module_invocation(module_type: &str, status: &str) {
    counter!(
        "modflow_module_invocations_total",
        "module_type" => module_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record child module invocation duration.
pub fn record_module_duration(duration: Duration, module_type: &str) {
    histogram!(
        "modflow_module_duration_seconds",
        "module_type" => module_type.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Status label for a result.
pub fn status_label<T>(result: &crate::error::Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(crate::error::Error::Timeout(_)) => "timeout",
        Err(_) => "failed",
    }
}
