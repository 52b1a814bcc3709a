//! Prometheus metrics for the action pipeline.
//!
//! - Runner invocations, failures by reason and latency
//! - Rate limiter rejections
//! - Attempt limiter throttling
//!
//! The recorder is process-wide: [`install_recorder`] installs it on first
//! use and hands every later caller the same handle, so the transport layer
//! can render the exposition text wherever it chooses.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use pipeline_core::Reason;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static RECORDER: OnceLock<Result<PrometheusHandle, MetricsError>> = OnceLock::new();

/// Errors from metrics operations.
#[derive(Error, Debug, Clone)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the pipeline's Prometheus recorder, or return the handle of the
/// one installed earlier in this process.
///
/// # Errors
///
/// Returns error if the exporter cannot be built, or if a different
/// recorder already owns the global slot.
///
/// # Example
///
/// ```rust,no_run
/// use pipeline_runtime::metrics::install_recorder;
///
/// # fn example() -> Result<(), pipeline_runtime::metrics::MetricsError> {
/// let handle = install_recorder()?;
/// println!("{}", handle.render());
/// # Ok(())
/// # }
/// ```
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    RECORDER
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Suffix("duration_seconds".to_string()),
                    DURATION_BUCKETS,
                )
                .map_err(|e| MetricsError::Build(e.to_string()))?
                .install_recorder()
                .map_err(|e| MetricsError::Install(e.to_string()))?;
            register_metrics();
            tracing::info!("Prometheus recorder installed");
            Ok(handle)
        })
        .clone()
}

fn register_metrics() {
    describe_counter!(
        "pipeline_actions_total",
        "Total number of actions run by the runner"
    );
    describe_counter!(
        "pipeline_action_errors_total",
        "Total number of failed runs, by reason"
    );
    describe_histogram!(
        "pipeline_action_duration_seconds",
        "Time taken to run an action"
    );
    describe_counter!(
        "pipeline_rate_limited_total",
        "Total number of requests rejected by the rate limiter"
    );
    describe_counter!(
        "pipeline_attempts_throttled_total",
        "Total number of checks refused by the attempt limiter"
    );
}

/// Runner metrics recorder.
pub struct RunnerMetrics;

impl RunnerMetrics {
    /// Record one runner invocation.
    pub fn record_run(duration: Duration) {
        counter!("pipeline_actions_total").increment(1);
        histogram!("pipeline_action_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a classified failure.
    pub fn record_error(reason: &Reason) {
        counter!("pipeline_action_errors_total", "reason" => reason.as_str().to_string())
            .increment(1);
    }
}

/// Limiter metrics recorder.
pub struct LimiterMetrics;

impl LimiterMetrics {
    /// Record a request rejected by the rate limiter.
    pub fn record_rate_limited() {
        counter!("pipeline_rate_limited_total").increment(1);
    }

    /// Record a check refused by the attempt limiter.
    pub fn record_attempt_throttled() {
        counter!("pipeline_attempts_throttled_total").increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_shared_and_records() {
        let first = install_recorder().unwrap();
        let second = install_recorder().unwrap();

        RunnerMetrics::record_run(Duration::from_millis(3));
        RunnerMetrics::record_error(&Reason::Validation);
        LimiterMetrics::record_rate_limited();
        LimiterMetrics::record_attempt_throttled();

        let text = second.render();
        assert!(text.contains("pipeline_actions_total"));
        assert!(text.contains("reason=\"VALIDATION\""));
        assert!(text.contains("pipeline_rate_limited_total"));
        assert!(first.render().contains("pipeline_attempts_throttled_total"));
    }
}
