// Poller Cancellation Token

use tokio::sync::watch;

/// Cancellation signal observed by `AsyncPoller::wait_with_cancel`
///
/// Checked between cycles only; a status check already in flight is never
/// interrupted.
#[derive(Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// Token that is never cancelled
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Wait for cancellation
    ///
    /// Pends forever for `never()` tokens and after the sender is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// Cancellation sender
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    /// Signal cancellation to every token of this channel
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a cancellation channel
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSender { tx }, CancelToken { rx: Some(rx) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (sender, token) = cancel_channel();
        let mut waiter = token.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        sender.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_token_stays_pending() {
        let mut token = CancelToken::never();

        let result = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;

        assert!(result.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let (sender, mut token) = cancel_channel();
        drop(sender);

        let result = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;

        assert!(result.is_err());
    }
}
