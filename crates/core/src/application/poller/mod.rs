// Async Poller - Polls hosts until a dispatched job finishes or times out

mod cancel;
pub mod constants;

pub use cancel::{cancel_channel, CancelSender, CancelToken};

use crate::domain::{
    Aggregate, CycleOutcome, DispatchOutcome, HostName, JobId, PollDelta, PollSession,
    StatusReport,
};
use crate::error::{AppError, Result};
use crate::port::{Notifier, StatusChecker, TimeProvider};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Async job poller
///
/// Owns one `PollSession` and drives it with the injected collaborators:
/// - `StatusChecker` asks the pending hosts about the job
/// - `Notifier` receives completion and progress events
/// - `TimeProvider` sleeps between cycles
pub struct AsyncPoller {
    session: PollSession,
    status_checker: Arc<dyn StatusChecker>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AsyncPoller {
    /// Create a poller from the outcome of the initial dispatch
    ///
    /// # Errors
    /// - `AppError::Domain` if the dispatch outcome is inconsistent (no job id
    ///   despite real results, started hosts without or with differing job ids)
    pub fn new(
        dispatch: DispatchOutcome,
        status_checker: Arc<dyn StatusChecker>,
        notifier: Arc<dyn Notifier>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        let hosts = dispatch.host_count();
        let session = PollSession::from_dispatch(dispatch)?;

        info!(
            job_id = ?session.job_id().map(JobId::as_str),
            hosts = hosts,
            pending = session.pending().len(),
            "Async poll session created"
        );

        Ok(Self {
            session,
            status_checker,
            notifier,
            time_provider,
        })
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.session.job_id()
    }

    /// Hosts still awaiting completion (unresolved after a timed-out wait)
    pub fn pending(&self) -> &BTreeSet<HostName> {
        self.session.pending()
    }

    pub fn is_done(&self) -> bool {
        self.session.is_done()
    }

    pub fn aggregate(&self) -> &Aggregate {
        self.session.aggregate()
    }

    pub fn session(&self) -> &PollSession {
        &self.session
    }

    /// Run one status check against every pending host
    ///
    /// Returns the changes of this cycle only. A failed status-check call
    /// marks every targeted host dark for this cycle; nothing is retried.
    pub async fn poll(&mut self) -> PollDelta {
        let Some(job_id) = self.session.job_id().cloned() else {
            debug!("No job to poll");
            return PollDelta::default();
        };
        let targets = self.session.targets();
        if targets.is_empty() {
            debug!(job_id = %job_id, "No pending hosts to poll");
            return PollDelta::default();
        }

        let start_time = self.time_provider.now_millis();
        let report = match self.status_checker.check_status(&job_id, &targets).await {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    hosts = targets.len(),
                    error = %e,
                    "Status check failed, marking targeted hosts unreachable"
                );
                StatusReport::unreachable(&targets, &e.to_string())
            }
        };

        let CycleOutcome { session, delta } = std::mem::take(&mut self.session).advance(report);
        self.session = session;
        self.notify_finished(&job_id, &delta);

        info!(
            job_id = %job_id,
            finished = delta.contacted.len(),
            dark = delta.dark.len(),
            running = delta.polled.len(),
            duration_ms = self.time_provider.now_millis() - start_time,
            "Poll cycle completed"
        );

        delta
    }

    /// Poll every `poll_interval_secs` until done or `total_secs` runs out
    ///
    /// Hosts still pending when the budget is exhausted are absent from the
    /// returned aggregate.
    ///
    /// # Errors
    /// - `AppError::Validation` if `poll_interval_secs` is zero
    pub async fn wait(&mut self, total_secs: u64, poll_interval_secs: u64) -> Result<Aggregate> {
        self.wait_with_cancel(total_secs, poll_interval_secs, CancelToken::never())
            .await
    }

    /// Same as `wait`, but also stops early once `cancel` fires
    pub async fn wait_with_cancel(
        &mut self,
        total_secs: u64,
        poll_interval_secs: u64,
        mut cancel: CancelToken,
    ) -> Result<Aggregate> {
        if poll_interval_secs == 0 {
            return Err(AppError::Validation(
                "poll interval must be at least one second".to_string(),
            ));
        }

        // No job id means every host was resolved at dispatch
        let Some(job_id) = self.session.job_id().cloned() else {
            return Ok(self.session.aggregate().clone());
        };

        let interval = Duration::from_secs(poll_interval_secs);
        let step = i64::try_from(poll_interval_secs).unwrap_or(i64::MAX);
        // Pre-decremented so that total == interval still polls once
        let mut clock = i64::try_from(total_secs).unwrap_or(i64::MAX) - step;
        let mut cycles = 0u64;
        let mut cancelled = false;

        info!(
            job_id = %job_id,
            total_secs = total_secs,
            poll_interval_secs = poll_interval_secs,
            pending = self.session.pending().len(),
            "Waiting for async job"
        );

        while clock >= 0 && !self.session.is_done() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = self.time_provider.sleep(interval) => {}
            }

            let delta = self.poll().await;
            cycles += 1;

            for (host, result) in &delta.polled {
                if result.is_started() {
                    self.notifier.on_async_poll(host, result, &job_id, clock);
                }
            }

            clock -= step;
        }

        if cancelled {
            warn!(
                job_id = %job_id,
                cycles = cycles,
                unresolved = self.session.pending().len(),
                "Wait cancelled"
            );
        } else if !self.session.is_done() {
            warn!(
                job_id = %job_id,
                cycles = cycles,
                unresolved = self.session.pending().len(),
                "Wait deadline reached with hosts still running"
            );
        } else {
            info!(job_id = %job_id, cycles = cycles, "Async job finished on all hosts");
        }

        Ok(self.session.aggregate().clone())
    }

    fn notify_finished(&self, job_id: &JobId, delta: &PollDelta) {
        for (host, result) in &delta.contacted {
            if result.is_failure() {
                self.notifier.on_async_failed(host, result, job_id);
            } else {
                self.notifier.on_async_ok(host, result, job_id);
            }
        }
        for (host, result) in &delta.dark {
            self.notifier.on_async_failed(host, result, job_id);
        }
    }
}
