//! Subscriber bookkeeping and non-blocking event fan-out.
//!
//! Each subscriber owns a bounded queue. Dispatch never blocks: when a
//! queue is full the event is dropped for that subscriber alone.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::debug;

use crate::client::EVENTS_TARGET;
use crate::event::Event;

/// Buffered events per subscriber.
pub const SUBSCRIBER_CAPACITY: usize = 5;

/// Handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Receive-only view of one subscription.
///
/// The stream ends, and `recv` returns `None`, once the subscription is
/// stopped or the event channel detaches.
#[derive(Debug)]
pub struct EventStream {
    id: SubscriptionId,
    receiver: Receiver<Event>,
}

impl EventStream {
    /// Registration handle used by [`crate::Client::stop`].
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Blocks until the next event or the end of the stream.
    #[must_use]
    pub fn recv(&self) -> Option<Event> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Returns a buffered event without blocking.
    pub fn try_recv(&self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Blocking iterator over the remaining events.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.receiver.iter()
    }
}

struct Subscriber {
    sender: SyncSender<Event>,
    filter: HashSet<String>,
}

impl Subscriber {
    fn wants(&self, event: &Event) -> bool {
        self.filter.is_empty() || event.is_error() || self.filter.contains(&event.message)
    }
}

/// Registered subscribers and their event-name filters.
///
/// Dispatch takes the read lock so fan-out never waits on other readers;
/// subscribe and unsubscribe take the write lock.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.len())
            .finish_non_exhaustive()
    }
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for `names`. An empty filter receives every
    /// event.
    pub fn subscribe<I, S>(&self, names: I) -> EventStream
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::sync_channel(SUBSCRIBER_CAPACITY);
        let filter = names.into_iter().map(Into::into).collect();
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Subscriber { sender, filter });
        EventStream { id, receiver }
    }

    /// Removes a subscriber and closes its queue. Returns `false` when the
    /// handle was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Offers `event` to every matching subscriber and returns how many
    /// accepted it.
    pub fn dispatch(&self, event: &Event) -> usize {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;
        for (id, subscriber) in subscribers.iter() {
            if !subscriber.wants(event) {
                continue;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(
                        target: EVENTS_TARGET,
                        subscriber = id.get(),
                        message = %event.message,
                        "subscriber queue full; event dropped"
                    );
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
        delivered
    }

    /// Closes every subscriber queue and empties the registry. Returns the
    /// number of queues closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        drained.len()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fans out events from `source` until it closes, then closes every
    /// subscriber.
    pub(crate) fn dispatch_until_closed(&self, source: &Receiver<Event>) {
        for event in source {
            self.dispatch(&event);
        }
        let closed = self.close_all();
        debug!(target: EVENTS_TARGET, closed, "event source closed; subscribers released");
    }
}
