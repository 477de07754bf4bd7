// Time Provider Port (for testability)

use async_trait::async_trait;
use std::time::Duration;

/// Time provider interface (allows mocking clocks and sleeps in tests)
#[async_trait]
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// System time provider (production)
pub struct SystemTimeProvider;

#[async_trait]
impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Virtual clock: `sleep` advances time instantly and is recorded
    #[derive(Clone, Default)]
    pub struct ManualTimeProvider {
        now_millis: Arc<Mutex<i64>>,
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl ManualTimeProvider {
        pub fn new(start_millis: i64) -> Self {
            Self {
                now_millis: Arc::new(Mutex::new(start_millis)),
                sleeps: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn advance(&self, duration: Duration) {
            *self.now_millis.lock().unwrap() += duration.as_millis() as i64;
        }

        pub fn sleep_count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TimeProvider for ManualTimeProvider {
        fn now_millis(&self) -> i64 {
            *self.now_millis.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }
}
