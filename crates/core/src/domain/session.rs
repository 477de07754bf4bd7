//! Poll Session - explicit state of one asynchronous job across poll cycles
//!
//! The session is a plain value: construction classifies the dispatch outcome,
//! and each cycle consumes the session together with a status report and hands
//! back the advanced session plus the delta of that cycle. No collaborator is
//! involved, so every transition can be tested in isolation.

use super::aggregate::{Aggregate, PollDelta};
use super::dispatch::{DispatchOutcome, StatusReport};
use super::error::{DomainError, Result};
use super::host::{HostName, HostResult, JobId};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Message recorded for pending hosts missing from a status report
pub const NO_STATUS_REPORTED: &str = "no status reported";

/// State of one poll session
///
/// Invariants:
/// - `pending` never shares a host with `aggregate.contacted` or `aggregate.dark`
/// - `job_id` is `None` only when `pending` is empty
/// - `done == pending.is_empty()`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSession {
    job_id: Option<JobId>,
    pending: BTreeSet<HostName>,
    aggregate: Aggregate,
    done: bool,
}

/// Result of advancing a session by one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub session: PollSession,
    pub delta: PollDelta,
}

impl PollSession {
    /// Classify every host of a dispatch outcome exactly once
    ///
    /// # Errors
    /// - `DomainError::MissingJobId` if a started host carries no job id
    /// - `DomainError::JobIdMismatch` if started hosts disagree on the job id
    /// - `DomainError::UndeterminedJobId` if some host returned a real
    ///   (non-skipped) result while no job was started anywhere
    /// - `DomainError::HostInBothSections` if a host is both contacted and dark
    pub fn from_dispatch(outcome: DispatchOutcome) -> Result<Self> {
        if let Some(host) = outcome.contacted.keys().find(|h| outcome.dark.contains_key(*h)) {
            return Err(DomainError::HostInBothSections { host: host.clone() });
        }

        let mut job_id: Option<JobId> = None;
        let mut pending = BTreeSet::new();
        let mut aggregate = Aggregate::default();
        let mut all_skipped = true;

        for (host, result) in outcome.contacted {
            if result.is_started() {
                let found = result
                    .job_id()
                    .ok_or_else(|| DomainError::MissingJobId { host: host.clone() })?;

                match &job_id {
                    Some(expected) if *expected != found => {
                        return Err(DomainError::JobIdMismatch {
                            host,
                            expected: expected.clone(),
                            found,
                        });
                    }
                    Some(_) => {}
                    None => job_id = Some(found),
                }
                pending.insert(host);
            } else {
                all_skipped &= result.is_skipped();
                aggregate.contacted.insert(host, result);
            }
        }

        aggregate.dark.extend(outcome.dark);

        if !all_skipped && job_id.is_none() {
            return Err(DomainError::UndeterminedJobId);
        }

        let done = pending.is_empty();
        Ok(Self {
            job_id,
            pending,
            aggregate,
            done,
        })
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn pending(&self) -> &BTreeSet<HostName> {
        &self.pending
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Hosts to target in the next status check
    pub fn targets(&self) -> Vec<HostName> {
        self.pending.iter().cloned().collect()
    }

    /// Fold one status report into the session
    ///
    /// Contacted answers are applied before dark ones; a host is classified at
    /// most once per cycle. Hosts that are not pending are ignored, and pending
    /// hosts absent from the report are classified dark.
    pub fn advance(mut self, report: StatusReport) -> CycleOutcome {
        let mut delta = PollDelta::default();
        let mut still_running = BTreeSet::new();

        for (host, result) in report.contacted {
            if !self.accepts(&host, &still_running) {
                continue;
            }
            self.pending.remove(&host);

            if result.is_started() {
                debug!(host = %host, "Job still running");
                still_running.insert(host.clone());
                delta.polled.insert(host, result);
            } else {
                debug!(host = %host, failed = result.is_failure(), "Job finished");
                delta.contacted.insert(host.clone(), result.clone());
                self.aggregate.contacted.insert(host, result);
            }
        }

        for (host, result) in report.dark {
            if !self.accepts(&host, &still_running) {
                continue;
            }
            self.pending.remove(&host);
            debug!(host = %host, "Host unreachable while polling");
            delta.dark.insert(host.clone(), result.clone());
            self.aggregate.dark.insert(host, result);
        }

        // Whatever is left was targeted but never answered.
        for host in std::mem::take(&mut self.pending) {
            warn!(host = %host, "Host missing from status report, marking unreachable");
            let result = HostResult::unreachable(NO_STATUS_REPORTED);
            delta.dark.insert(host.clone(), result.clone());
            self.aggregate.dark.insert(host, result);
        }

        self.pending = still_running;
        self.done = self.pending.is_empty();

        CycleOutcome {
            session: self,
            delta,
        }
    }

    // `pending` shrinks while a report is applied; hosts moved to
    // `still_running` have already been classified this cycle.
    fn accepts(&self, host: &HostName, still_running: &BTreeSet<HostName>) -> bool {
        if self.pending.contains(host) {
            return true;
        }
        if still_running.contains(host) || self.aggregate.contains(host) {
            warn!(host = %host, "Duplicate or terminal host in status report, ignoring");
        } else {
            warn!(host = %host, "Unexpected host in status report, ignoring");
        }
        false
    }
}
