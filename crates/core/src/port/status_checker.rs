// Status Checker Port
// Abstraction for asking a set of hosts about an asynchronous job

use crate::domain::{HostName, JobId, StatusReport};
use async_trait::async_trait;
use thiserror::Error;

/// Status check errors (the whole call failed, not a single host)
#[derive(Error, Debug)]
pub enum StatusCheckError {
    #[error("Invalid status command: {0}")]
    InvalidCommand(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Status Checker trait
///
/// Implementations fan out to the given hosts however they like; the poller
/// issues exactly one call per cycle and never retries it.
///
/// Implementations:
/// - CommandStatusChecker: runs a command per host (infra-system)
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// Ask `hosts` for the status of `job_id`
    ///
    /// Per-host problems belong in `StatusReport::dark`; an `Err` means no
    /// host could be asked at all.
    async fn check_status(
        &self,
        job_id: &JobId,
        hosts: &[HostName],
    ) -> Result<StatusReport, StatusCheckError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One scripted answer of the mock checker
    #[derive(Debug, Clone)]
    pub enum ScriptedAnswer {
        /// Answer with this report
        Report(StatusReport),
        /// Fail the whole call with this message
        Fail(String),
        /// Report every targeted host as still running
        AllRunning,
    }

    /// Mock Status Checker: answers from a script, records every call
    #[derive(Clone, Default)]
    pub struct ScriptedStatusChecker {
        script: Arc<Mutex<VecDeque<ScriptedAnswer>>>,
        calls: Arc<Mutex<Vec<(JobId, Vec<HostName>)>>>,
    }

    impl ScriptedStatusChecker {
        pub fn new(answers: impl IntoIterator<Item = ScriptedAnswer>) -> Self {
            Self {
                script: Arc::new(Mutex::new(answers.into_iter().collect())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Checker whose job never finishes
        pub fn never_finishing() -> Self {
            Self::default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<(JobId, Vec<HostName>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusChecker for ScriptedStatusChecker {
        async fn check_status(
            &self,
            job_id: &JobId,
            hosts: &[HostName],
        ) -> Result<StatusReport, StatusCheckError> {
            self.calls
                .lock()
                .unwrap()
                .push((job_id.clone(), hosts.to_vec()));

            // Empty script means the job is still running everywhere
            let answer = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ScriptedAnswer::AllRunning);

            match answer {
                ScriptedAnswer::Report(report) => Ok(report),
                ScriptedAnswer::Fail(msg) => Err(StatusCheckError::Transport(msg)),
                ScriptedAnswer::AllRunning => {
                    let mut report = StatusReport::new();
                    for host in hosts {
                        report = report.with_contacted(
                            host.clone(),
                            serde_json::json!({"started": 1, "finished": 0, "job_id": job_id.as_str()}),
                        );
                    }
                    Ok(report)
                }
            }
        }
    }
}
