/*
[INPUT]:  Push events published by an instruction manager
[OUTPUT]: EventHub fan-out with per-kind filters and Subscription disposer handles
[POS]:    Event layer - ordered push-event delivery to UI subscribers
[UPDATE]: 2026-10-12 Replace callback registration with channel subscriptions
[UPDATE]: 2026-10-14 Drop closed subscribers on emit
[UPDATE]: 2026-10-16 Expose disconnection from try_recv; add close for manager teardown
*/

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

pub use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, trace};

use crate::types::{InstructionFeedback, ObjectProgress, StepProgress, TaskDescriptor, TaskState};

/// Events pushed by the instruction manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    TasksLoaded(Vec<TaskDescriptor>),
    Feedback(InstructionFeedback),
    StateChanged(TaskState),
    ObjectProgressUpdated(ObjectProgress),
    RelevantObjectsUpdated(ObjectProgress),
    StepProgressUpdated(StepProgress),
}

impl ManagerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ManagerEvent::TasksLoaded(_) => EventKind::TasksLoaded,
            ManagerEvent::Feedback(_) => EventKind::Feedback,
            ManagerEvent::StateChanged(_) => EventKind::StateChanged,
            ManagerEvent::ObjectProgressUpdated(_) => EventKind::ObjectProgressUpdated,
            ManagerEvent::RelevantObjectsUpdated(_) => EventKind::RelevantObjectsUpdated,
            ManagerEvent::StepProgressUpdated(_) => EventKind::StepProgressUpdated,
        }
    }
}

/// Names of the push events, used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TasksLoaded,
    Feedback,
    StateChanged,
    ObjectProgressUpdated,
    RelevantObjectsUpdated,
    StepProgressUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::TasksLoaded,
        EventKind::Feedback,
        EventKind::StateChanged,
        EventKind::ObjectProgressUpdated,
        EventKind::RelevantObjectsUpdated,
        EventKind::StepProgressUpdated,
    ];
}

type SubscriberId = u64;

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    kinds: HashSet<EventKind>,
    tx: mpsc::UnboundedSender<ManagerEvent>,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: SubscriberId,
    subscribers: Vec<Subscriber>,
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishing side of the push feed.
///
/// Each subscriber receives the events it registered for, in emission order.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for the given event kinds. Dropping the returned handle deregisters.
    pub fn subscribe(&self, kinds: impl IntoIterator<Item = EventKind>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let kinds: HashSet<EventKind> = kinds.into_iter().collect();

        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        debug!(subscriber = id, kinds = kinds.len(), "subscriber registered");
        inner.subscribers.push(Subscriber { id, kinds, tx });

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Deliver an event to every matching subscriber. Returns the delivery count.
    pub fn emit(&self, event: ManagerEvent) -> usize {
        let kind = event.kind();
        let mut inner = lock(&self.inner);
        let mut delivered = 0;

        inner.subscribers.retain(|subscriber| {
            if !subscriber.kinds.contains(&kind) {
                return !subscriber.tx.is_closed();
            }
            match subscriber.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        trace!(?kind, delivered, "event emitted");
        delivered
    }

    /// Drop every subscriber. Their queues drain, then report disconnection.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        debug!(subscribers = inner.subscribers.len(), "event hub closed");
        inner.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    fn remove(inner: &Mutex<HubInner>, id: SubscriberId) {
        let mut inner = lock(inner);
        inner.subscribers.retain(|subscriber| subscriber.id != id);
        debug!(subscriber = id, "subscriber removed");
    }
}

/// Receiving side of a registration. Acts as the disposer handle.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    hub: Weak<Mutex<HubInner>>,
    rx: mpsc::UnboundedReceiver<ManagerEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once the hub is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<ManagerEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting. `Disconnected` once the hub closed
    /// this subscription and the queue is drained.
    pub fn try_recv(&mut self) -> Result<ManagerEvent, TryRecvError> {
        self.rx.try_recv()
    }

    /// Explicitly deregister. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            EventHub::remove(&inner, self.id);
        }
    }
}
