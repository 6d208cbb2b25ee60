//! Process-wide message delivery with scoped subscriptions.
//!
//! Every payload that arrives from the embedding boundary is handed to
//! [`MessageHub::deliver`], which fans it out to all current subscribers.
//! A subscriber holds a [`Subscription`]; dropping it removes the handler
//! from the hub and stops its delivery task, so a harness that is mounted,
//! unmounted and mounted again never ends up registered twice.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<Value>>>,
}

impl HubInner {
    fn remove(&self, id: u64) {
        match self.subscribers.lock() {
            Ok(mut subs) => {
                subs.remove(&id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&id);
            }
        }
    }
}

/// Cheaply cloneable handle to the shared subscriber registry.
#[derive(Clone, Default)]
pub struct MessageHub {
    inner: Arc<HubInner>,
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `payload` to every subscriber.  Returns how many received it.
    ///
    /// Subscribers whose delivery task has died are pruned.
    pub fn deliver(&self, payload: Value) -> usize {
        let mut subs = match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut delivered = 0;
        subs.retain(|id, tx| match tx.send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                warn!("subscription {id} is gone; pruning");
                false
            }
        });

        debug!("delivered message to {delivered} subscriber(s)");
        delivered
    }

    /// Registers `handler`, which runs once per delivered payload, in
    /// delivery order, on a dedicated task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F, Fut>(&self, mut handler: F) -> Subscription
    where
        F: FnMut(Value) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        match self.inner.subscribers.lock() {
            Ok(mut subs) => {
                subs.insert(id, tx);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, tx);
            }
        }

        let task = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                handler(payload).await;
            }
        });

        debug!("subscription {id} registered");
        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
            task,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        match self.inner.subscribers.lock() {
            Ok(subs) => subs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// A live registration on a [`MessageHub`].  Unregisters on drop.
pub struct Subscription {
    id: u64,
    hub: Weak<HubInner>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
        self.task.abort();
        debug!("subscription {} released", self.id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_deliver_reaches_subscriber() {
        // Arrange
        let hub = MessageHub::new();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let _sub = hub.subscribe(move |payload| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(payload);
            }
        });

        // Act
        let delivered = hub.deliver(json!({"name": "x"}));

        // Assert
        assert_eq!(delivered, 1);
        let got = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, json!({"name": "x"}));
    }

    #[tokio::test]
    async fn test_deliver_preserves_order() {
        let hub = MessageHub::new();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let _sub = hub.subscribe(move |payload| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(payload);
            }
        });

        for i in 0..5 {
            hub.deliver(json!(i));
        }

        for i in 0..5 {
            let got = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(got, json!(i));
        }
    }

    #[tokio::test]
    async fn test_dropping_subscription_unregisters() {
        let hub = MessageHub::new();
        let sub = hub.subscribe(|_| async {});
        assert_eq!(hub.subscriber_count(), 1);

        drop(sub);

        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.deliver(json!(null)), 0);
    }

    #[tokio::test]
    async fn test_subscriptions_get_distinct_ids() {
        let hub = MessageHub::new();
        let a = hub.subscribe(|_| async {});
        let b = hub.subscribe(|_| async {});

        assert_ne!(a.id(), b.id());
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_deliver_with_no_subscribers_reaches_nobody() {
        let hub = MessageHub::new();
        assert_eq!(hub.deliver(json!({"name": "x"})), 0);
    }

    #[tokio::test]
    async fn test_subscription_outliving_hub_drops_cleanly() {
        let hub = MessageHub::new();
        let sub = hub.subscribe(|_| async {});
        drop(hub);
        drop(sub);
    }
}
