// Tracing notifier implementation
// Reports async job progress as structured log events
use hostpoll_core::domain::{HostResult, JobId};
use hostpoll_core::port::Notifier;
use tracing::{info, warn};

/// Notifier that writes every event to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

fn message(result: &HostResult) -> &str {
    result
        .as_value()
        .get("msg")
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

impl Notifier for TracingNotifier {
    fn on_async_failed(&self, host: &str, result: &HostResult, job_id: &JobId) {
        warn!(
            host = %host,
            job_id = %job_id,
            rc = ?result.rc(),
            msg = %message(result),
            "Async job failed"
        );
    }

    fn on_async_ok(&self, host: &str, result: &HostResult, job_id: &JobId) {
        info!(
            host = %host,
            job_id = %job_id,
            rc = ?result.rc(),
            "Async job finished"
        );
    }

    fn on_async_poll(&self, host: &str, _result: &HostResult, job_id: &JobId, seconds_remaining: i64) {
        info!(
            host = %host,
            job_id = %job_id,
            seconds_remaining = seconds_remaining,
            "Async job still running"
        );
    }
}
