//! Detached notification delivery.
//!
//! Request handlers publish domain events and return; the fan-out they
//! trigger must outlive the request. [`BackgroundNotifier`] moves each
//! `notify` onto its own task so dropping the caller's future never cuts a
//! fan-out short.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::domain::foundation::UserId;
use crate::domain::messaging::NotificationPayload;
use crate::ports::Notifier;

/// `Notifier` decorator that spawns the wrapped notifier's work.
///
/// Spawned deliveries race the shutdown token; once it fires, in-flight
/// fan-outs are abandoned and new ones are not started.
pub struct BackgroundNotifier {
    inner: Arc<dyn Notifier>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl BackgroundNotifier {
    pub fn new(inner: Arc<dyn Notifier>, shutdown: CancellationToken) -> Self {
        Self {
            inner,
            tracker: TaskTracker::new(),
            shutdown,
        }
    }

    /// Number of deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for in-flight deliveries, up to `timeout`.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok();
        if !drained {
            tracing::warn!(in_flight = self.tracker.len(), "Notification drain timed out");
        }
        drained
    }
}

#[async_trait]
impl Notifier for BackgroundNotifier {
    async fn notify(&self, recipients: Vec<UserId>, payload: NotificationPayload) {
        if self.shutdown.is_cancelled() {
            tracing::debug!(recipients = recipients.len(), "Shutting down, notification skipped");
            return;
        }

        let inner = self.inner.clone();
        let shutdown = self.shutdown.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                () = inner.notify(recipients, payload) => {}
                () = shutdown.cancelled() => {
                    tracing::debug!("Notification abandoned on shutdown");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, Notify};

    struct ChannelNotifier(mpsc::UnboundedSender<Vec<UserId>>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, recipients: Vec<UserId>, _payload: NotificationPayload) {
            let _ = self.0.send(recipients);
        }
    }

    struct BlockedNotifier(Arc<Notify>);

    #[async_trait]
    impl Notifier for BlockedNotifier {
        async fn notify(&self, _recipients: Vec<UserId>, _payload: NotificationPayload) {
            self.0.notified().await;
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload::new("{}").unwrap()
    }

    #[tokio::test]
    async fn delivery_continues_after_caller_returns() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = BackgroundNotifier::new(Arc::new(ChannelNotifier(tx)), CancellationToken::new());
        let user = UserId::new();

        notifier.notify(vec![user], payload()).await;

        assert_eq!(rx.recv().await, Some(vec![user]));
    }

    #[tokio::test]
    async fn nothing_is_spawned_after_shutdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let notifier = BackgroundNotifier::new(Arc::new(ChannelNotifier(tx)), shutdown.clone());

        shutdown.cancel();
        notifier.notify(vec![UserId::new()], payload()).await;

        assert!(notifier.drain(Duration::from_secs(1)).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_abandons_blocked_delivery() {
        let shutdown = CancellationToken::new();
        let notifier = BackgroundNotifier::new(Arc::new(BlockedNotifier(Arc::new(Notify::new()))), shutdown.clone());

        notifier.notify(vec![UserId::new()], payload()).await;
        assert_eq!(notifier.in_flight(), 1);

        shutdown.cancel();
        assert!(notifier.drain(Duration::from_secs(1)).await);
        assert_eq!(notifier.in_flight(), 0);
    }

    #[tokio::test]
    async fn drain_times_out_on_stuck_delivery() {
        let notifier = BackgroundNotifier::new(
            Arc::new(BlockedNotifier(Arc::new(Notify::new()))),
            CancellationToken::new(),
        );

        notifier.notify(vec![UserId::new()], payload()).await;

        assert!(!notifier.drain(Duration::from_millis(50)).await);
    }
}
