use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use vivah_shared::clients::rabbitmq::RabbitMQClient;
use vivah_shared::types::event::{payloads::LikeReceived, routing_keys, Event};

pub const SERVICE_NAME: &str = "vivah-matchmaking";

/// Outbound channel for "someone liked you" notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_like_notification(&self, notification: LikeReceived) -> anyhow::Result<()>;
}

/// Publishes `vivah.matching.like.received` on the events exchange. The
/// notification service owns delivery from there.
pub struct RabbitNotifier {
    rabbitmq: RabbitMQClient,
}

impl RabbitNotifier {
    pub fn new(rabbitmq: RabbitMQClient) -> Self {
        Self { rabbitmq }
    }
}

#[async_trait]
impl Notifier for RabbitNotifier {
    async fn send_like_notification(&self, notification: LikeReceived) -> anyhow::Result<()> {
        let recipient = notification.recipient_user_id;
        let event = Event::new(SERVICE_NAME, routing_keys::MATCHING_LIKE_RECEIVED, notification)
            .with_user(recipient);

        self.rabbitmq
            .publish(routing_keys::MATCHING_LIKE_RECEIVED, &event)
            .await
    }
}

/// Hands notifications to a background worker through a bounded queue.
/// Enqueueing never waits: when the queue is full the notification is
/// dropped and counted.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<LikeReceived>,
}

impl NotificationDispatcher {
    /// Spawns the worker on the current runtime. The worker exits once every
    /// dispatcher clone has been dropped and the queue is drained.
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<LikeReceived>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let recipient = notification.recipient_user_id;
                if let Err(e) = notifier.send_like_notification(notification).await {
                    counter!("like_notifications_failed_total").increment(1);
                    tracing::error!(error = %e, recipient = %recipient, "failed to send like notification");
                }
            }
            tracing::debug!("notification worker stopped");
        });

        (Self { tx }, worker)
    }

    pub fn dispatch(&self, notification: LikeReceived) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                counter!("like_notifications_dropped_total").increment(1);
                tracing::warn!(recipient = %n.recipient_user_id, "notification queue full, dropping like notification");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                counter!("like_notifications_dropped_total").increment(1);
                tracing::warn!(recipient = %n.recipient_user_id, "notification worker gone, dropping like notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<LikeReceived>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send_like_notification(&self, notification: LikeReceived) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    /// Blocks on the first notification until released.
    struct Gated {
        gate: Arc<Notify>,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for Gated {
        async fn send_like_notification(&self, _: LikeReceived) -> anyhow::Result<()> {
            if self.seen.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send_like_notification(&self, _: LikeReceived) -> anyhow::Result<()> {
            anyhow::bail!("broker unavailable")
        }
    }

    fn like(name: &str) -> LikeReceived {
        LikeReceived {
            recipient_user_id: Uuid::new_v4(),
            liker_profile_id: 7,
            liker_display_name: name.into(),
        }
    }

    #[tokio::test]
    async fn worker_delivers_in_order() {
        let notifier = Arc::new(Recording::default());
        let (dispatcher, worker) = NotificationDispatcher::spawn(notifier.clone(), 8);

        dispatcher.dispatch(like("Anjali"));
        dispatcher.dispatch(like("Divya"));
        drop(dispatcher);
        worker.await.unwrap();

        let names: Vec<String> = notifier
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.liker_display_name.clone())
            .collect();
        assert_eq!(names, vec!["Anjali", "Divya"]);
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let gate = Arc::new(Notify::new());
        let notifier = Arc::new(Gated {
            gate: gate.clone(),
            seen: AtomicUsize::new(0),
        });
        let (dispatcher, worker) = NotificationDispatcher::spawn(notifier.clone(), 1);

        dispatcher.dispatch(like("first"));
        // Let the worker pick up the first one and park on the gate.
        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.dispatch(like("queued"));
        dispatcher.dispatch(like("dropped"));

        gate.notify_one();
        drop(dispatcher);
        worker.await.unwrap();
        assert_eq!(notifier.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_worker() {
        let (dispatcher, worker) = NotificationDispatcher::spawn(Arc::new(Failing), 4);
        dispatcher.dispatch(like("a"));
        dispatcher.dispatch(like("b"));
        drop(dispatcher);
        worker.await.unwrap();
    }
}
