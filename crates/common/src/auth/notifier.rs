//! Session event sinks

use authpipe_domain::SessionEvent;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::traits::Notifier;

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: SessionEvent) {}
}

/// Logs events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: SessionEvent) {
        match event {
            SessionEvent::SessionExpired { reason } => {
                warn!(reason = %reason, "Session expired; re-authentication required");
            }
            SessionEvent::LoggedOut => info!("Session cleared by logout"),
        }
    }
}

/// Fans events out to any number of subscribers
///
/// Applications subscribe to route the user back to login on
/// [`SessionEvent::SessionExpired`]. Events sent with no live subscriber
/// are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl ChannelNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: SessionEvent) {
        // Err only means nobody is subscribed
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use authpipe_domain::UnauthorizedReason;

    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers_to_subscribers() {
        let notifier = ChannelNotifier::new(4);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        let event = SessionEvent::SessionExpired {
            reason: UnauthorizedReason::RetryRejected { status: 401 },
        };
        notifier.notify(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_channel_notifier_without_subscribers_does_not_fail() {
        let notifier = ChannelNotifier::default();
        notifier.notify(SessionEvent::LoggedOut);
    }
}
