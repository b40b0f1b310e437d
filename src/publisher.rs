//! View Publisher - fan-out of immutable snapshots to subscribers
//!
//! The ingestion task is the only caller of [`ViewPublisher::publish`];
//! everybody else holds a cloned handle and either reads
//! [`ViewPublisher::current_snapshot`] or subscribes. Subscribers get
//! `Arc<DashboardSnapshot>` values and can never reach the store.

use crate::snapshot::DashboardSnapshot;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub type SubscriptionId = u64;

/// Snapshots a channel subscriber may have queued before it is dropped
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 1024;

type SnapshotCallback = Box<dyn Fn(&Arc<DashboardSnapshot>) + Send + Sync>;

enum SubscriberEndpoint {
    Channel(mpsc::Sender<Arc<DashboardSnapshot>>),
    Callback(SnapshotCallback),
}

struct PublisherInner {
    current: Arc<DashboardSnapshot>,
    subscribers: BTreeMap<SubscriptionId, SubscriberEndpoint>,
    next_id: SubscriptionId,
}

impl PublisherInner {
    fn register(&mut self, endpoint: SubscriberEndpoint) -> SubscriptionId {
        self.next_id += 1;
        let id = self.next_id;
        self.subscribers.insert(id, endpoint);
        id
    }
}

fn lock(inner: &Mutex<PublisherInner>) -> MutexGuard<'_, PublisherInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cheaply clonable handle; all clones share one subscriber table
#[derive(Clone)]
pub struct ViewPublisher {
    inner: Arc<Mutex<PublisherInner>>,
}

impl ViewPublisher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PublisherInner {
                current: Arc::new(DashboardSnapshot::empty()),
                subscribers: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Make `snapshot` current and deliver it to every subscriber.
    ///
    /// Returns `false` and delivers nothing when the snapshot does not
    /// advance the sequence, so subscribers only ever see it increase.
    pub fn publish(&self, snapshot: DashboardSnapshot) -> bool {
        let mut inner = lock(&self.inner);

        if snapshot.sequence <= inner.current.sequence {
            log::debug!(
                "Ignoring stale snapshot #{} (current #{})",
                snapshot.sequence,
                inner.current.sequence
            );
            return false;
        }

        let snapshot = Arc::new(snapshot);
        inner.current = snapshot.clone();

        let mut pruned = Vec::new();
        for (id, endpoint) in inner.subscribers.iter() {
            match endpoint {
                SubscriberEndpoint::Channel(tx) => match tx.try_send(snapshot.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        log::warn!("⚠️  Subscription {} fell behind, dropping it", id);
                        pruned.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        log::debug!("Pruned closed subscription {}", id);
                        pruned.push(*id);
                    }
                },
                SubscriberEndpoint::Callback(callback) => callback(&snapshot),
            }
        }

        for id in pruned {
            inner.subscribers.remove(&id);
        }

        true
    }

    /// Channel-backed subscription, delivering every snapshot published
    /// from now on. See [`ViewPublisher::subscribe_with_capacity`].
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// A subscriber holding `capacity` undrained snapshots is dropped on
    /// the next publish: its `recv` yields what was queued, then `None`.
    /// Publishing never blocks on a slow reader.
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = lock(&self.inner).register(SubscriberEndpoint::Channel(tx));
        log::debug!("Subscription {} registered", id);

        Subscription {
            id,
            receiver: rx,
            publisher: Arc::downgrade(&self.inner),
        }
    }

    /// Register a callback run synchronously, in publish order, for every
    /// snapshot. It runs while the subscriber table is locked and must not
    /// call back into the publisher.
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Arc<DashboardSnapshot>) + Send + Sync + 'static,
    {
        let id = lock(&self.inner).register(SubscriberEndpoint::Callback(Box::new(callback)));
        log::debug!("Callback subscription {} registered", id);
        SubscriptionHandle { id }
    }

    /// Stop delivery to a callback subscription. Returns whether it was live.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        lock(&self.inner).subscribers.remove(&handle.id).is_some()
    }

    /// Latest published snapshot (sequence 0 before the first publish)
    pub fn current_snapshot(&self) -> Arc<DashboardSnapshot> {
        lock(&self.inner).current.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

impl Default for ViewPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`ViewPublisher::subscribe_fn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Receiving end of [`ViewPublisher::subscribe`]; dropping it unsubscribes
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<Arc<DashboardSnapshot>>,
    publisher: Weak<Mutex<PublisherInner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next snapshot, or `None` once every publisher handle is gone or
    /// this subscription was dropped for falling behind
    pub async fn recv(&mut self) -> Option<Arc<DashboardSnapshot>> {
        self.receiver.recv().await
    }

    /// Next already-delivered snapshot without waiting
    pub fn try_recv(&mut self) -> Option<Arc<DashboardSnapshot>> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.publisher.upgrade() {
            lock(&inner).subscribers.remove(&self.id);
            log::debug!("Subscription {} removed", self.id);
        }
    }
}
