// Notifier Port
// Fire-and-forget progress events for observers

use crate::domain::{HostResult, JobId};

/// Notification sink for asynchronous job progress
///
/// Called synchronously from the poll loop; implementations must not block.
pub trait Notifier: Send + Sync {
    /// Job finished with a failure, or the host went dark while polling
    fn on_async_failed(&self, host: &str, result: &HostResult, job_id: &JobId);

    /// Job finished successfully
    fn on_async_ok(&self, host: &str, result: &HostResult, job_id: &JobId);

    /// Job still running; `seconds_remaining` is the wait budget left
    fn on_async_poll(&self, host: &str, result: &HostResult, job_id: &JobId, seconds_remaining: i64);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Captured notification
    #[derive(Debug, Clone, PartialEq)]
    pub enum NotifierEvent {
        Failed {
            host: String,
            job_id: JobId,
        },
        Ok {
            host: String,
            job_id: JobId,
        },
        Poll {
            host: String,
            job_id: JobId,
            seconds_remaining: i64,
        },
    }

    /// Mock Notifier recording every event in order
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        events: Arc<Mutex<Vec<NotifierEvent>>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<NotifierEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn failed_hosts(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    NotifierEvent::Failed { host, .. } => Some(host),
                    _ => None,
                })
                .collect()
        }

        pub fn ok_hosts(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    NotifierEvent::Ok { host, .. } => Some(host),
                    _ => None,
                })
                .collect()
        }

        pub fn poll_events(&self) -> Vec<(String, i64)> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    NotifierEvent::Poll {
                        host,
                        seconds_remaining,
                        ..
                    } => Some((host, seconds_remaining)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn on_async_failed(&self, host: &str, _result: &HostResult, job_id: &JobId) {
            self.events.lock().unwrap().push(NotifierEvent::Failed {
                host: host.to_string(),
                job_id: job_id.clone(),
            });
        }

        fn on_async_ok(&self, host: &str, _result: &HostResult, job_id: &JobId) {
            self.events.lock().unwrap().push(NotifierEvent::Ok {
                host: host.to_string(),
                job_id: job_id.clone(),
            });
        }

        fn on_async_poll(
            &self,
            host: &str,
            _result: &HostResult,
            job_id: &JobId,
            seconds_remaining: i64,
        ) {
            self.events.lock().unwrap().push(NotifierEvent::Poll {
                host: host.to_string(),
                job_id: job_id.clone(),
                seconds_remaining,
            });
        }
    }
}
