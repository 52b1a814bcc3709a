//! Alert sinks: where classified failures are reported for operators.
//!
//! Actions mute expected failures through
//! [`Action::prepare_error_alert`](pipeline_core::Action::prepare_error_alert);
//! everything else reaches the sink.

use pipeline_core::{ClassifiedError, Payload};

/// Receives alertable failures.
pub trait AlertSink: Send + Sync {
    /// Report `err` raised by `action` for input `arg`.
    fn alert(&self, action: &str, err: &ClassifiedError, arg: &Payload);
}

/// Sink that emits an `ERROR` event on target `pipeline::alert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, action: &str, err: &ClassifiedError, _arg: &Payload) {
        tracing::error!(
            target: "pipeline::alert",
            action = %action,
            reason = %err.reason,
            details = err.details.as_deref().unwrap_or_default(),
            "{}",
            err.message
        );
    }
}

/// Sink that drops every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertSink;

impl AlertSink for NoopAlertSink {
    fn alert(&self, _action: &str, _err: &ClassifiedError, _arg: &Payload) {}
}
