//! Subscriber registrations and fan-out.

use std::sync::{Mutex, PoisonError};

use shikago_core::Message;
use tokio::sync::mpsc;
use tracing::debug;

/// One registered subscriber.
///
/// Messages are queued without blocking and forwarded to the subscriber's
/// channel by a dedicated task, in the order they were queued.
#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    queue: mpsc::UnboundedSender<Message>,
}

impl Subscription {
    /// Starts the forwarding task for `target`.
    pub(crate) fn spawn(target: mpsc::Sender<Message>) -> Self {
        let (queue, mut pending) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(message) = pending.recv().await {
                if target.send(message).await.is_err() {
                    debug!("Subscriber channel closed, stopping delivery");
                    break;
                }
            }
        });

        Self { queue }
    }

    /// Queues a message for delivery. Never blocks, never fails the caller.
    pub(crate) fn deliver(&self, message: Message) {
        // Err means the forwarding task has stopped; the message is dropped.
        let _ = self.queue.send(message);
    }
}

/// The subscriber list of one partition.
///
/// Registration takes the lock; delivery works on a snapshot so that
/// sending never happens under the lock.
#[derive(Debug, Default)]
pub(crate) struct SubscriberSet {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriberSet {
    pub(crate) fn register(&self, target: mpsc::Sender<Message>) {
        let subscription = Subscription::spawn(target);
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscription);
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers a copy of `message` to every subscriber registered now.
    pub(crate) fn fan_out(&self, message: &Message) {
        for subscription in self.snapshot() {
            subscription.deliver(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shikago_core::MessageId;
    use tokio::time::timeout;

    use super::*;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn message(id: u64) -> Message {
        Message::new(MessageId::new(id), format!("m{id}"))
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_subscriber_in_order() {
        let set = SubscriberSet::default();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        set.register(tx_a);
        set.register(tx_b);
        assert_eq!(set.len(), 2);

        for id in 1..=3 {
            set.fan_out(&message(id));
        }

        for rx in [&mut rx_a, &mut rx_b] {
            for id in 1..=3 {
                let got = timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
                assert_eq!(got.id, MessageId::new(id));
            }
        }
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_block_others() {
        let set = SubscriberSet::default();
        // Capacity 1 and never drained past the first message.
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(16);
        set.register(slow_tx);
        set.register(fast_tx);

        for id in 1..=10 {
            set.fan_out(&message(id));
        }

        for id in 1..=10 {
            let got = timeout(TEST_TIMEOUT, fast_rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(got.id, MessageId::new(id));
        }
    }

    #[tokio::test]
    async fn test_closed_subscriber_is_ignored() {
        let set = SubscriberSet::default();
        let (tx, rx) = mpsc::channel(1);
        set.register(tx);
        drop(rx);

        // Must not panic or error.
        set.fan_out(&message(1));
        set.fan_out(&message(2));
        assert_eq!(set.len(), 1);
    }
}
