//! # Action Pipeline Runtime
//!
//! Executes actions and guards the pipeline.
//!
//! ## Core Components
//!
//! - **`ActionRunner`**: runs an action, classifies failures, routes alerts
//! - **`RateLimiter`**: per-key token bucket with a periodic full clear
//! - **`AttemptLimiter`**: per-key failure counter (brute-force guard)
//! - **Metrics / telemetry**: Prometheus recorder and tracing setup
//!
//! ## Example
//!
//! ```
//! use pipeline_core::{NopAction, Payload};
//! use pipeline_runtime::ActionRunner;
//!
//! # tokio_test::block_on(async {
//! let runner = ActionRunner::for_profile(false);
//! let result = runner.run(&NopAction, || Ok(Payload::Empty)).await;
//! assert!(result.is_success());
//! # });
//! ```

/// Alert sinks for classified failures
pub mod alert;

/// Failed-attempt limiter
pub mod attempt_limiter;

/// Prometheus metrics for observability
pub mod metrics;

/// Per-key token-bucket rate limiter
pub mod rate_limiter;

/// The action runner
pub mod runner;

/// Tracing subscriber setup
pub mod telemetry;

pub use alert::{AlertSink, NoopAlertSink, TracingAlertSink};
pub use attempt_limiter::AttemptLimiter;
pub use rate_limiter::RateLimiter;
pub use runner::ActionRunner;
