use crate::domain::model::{Notification, NotificationKind};
use crate::domain::ports::NotificationSink;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// 將通知寫入日誌
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!("✅ {}: {}", notification.title, notification.message)
            }
            NotificationKind::Error => {
                tracing::warn!("❌ {}: {}", notification.title, notification.message)
            }
        }
    }
}

/// 透過 channel 將通知轉交給介面層
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards_in_order() {
        let (notifier, mut receiver) = ChannelNotifier::channel();

        notifier.notify(Notification::error("Not Found", "No circuit found"));
        notifier.notify(Notification::success("Circuit Found", "Loaded"));

        assert_eq!(receiver.recv().await.unwrap().title, "Not Found");
        assert_eq!(receiver.recv().await.unwrap().kind, NotificationKind::Success);
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (notifier, receiver) = ChannelNotifier::channel();
        drop(receiver);
        notifier.notify(Notification::success("Circuit Updated", "saved"));
    }
}
