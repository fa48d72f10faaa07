//! Typed event bus connecting event producers with registered observers.
//!
//! The bus replaces ambient publish/subscribe lookups with explicit
//! registration: the composition root owns the bus, producers push events
//! into it, and consumers hold a [`SubscriptionId`] whose lifetime they
//! manage by unsubscribing when their owning component shuts down.

use std::fmt;

use crate::Event;

/// Callback invoked for every event published while its subscription lives.
pub type EventCallback = Box<dyn FnMut(&Event)>;

/// Identifier returned by [`EventBus::subscribe`], used to cancel delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

struct Subscriber {
    id: SubscriptionId,
    callback: EventCallback,
}

/// Delivers published events to subscribers in registration order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    /// Creates an empty bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns the id that cancels it.
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, callback });
        id
    }

    /// Cancels a subscription, reporting whether it was still registered.
    ///
    /// Unsubscribing an id twice is a no-op returning `false`, so component
    /// teardown never has to track whether it already ran.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self
            .subscribers
            .iter()
            .position(|subscriber| subscriber.id == id)
        {
            Some(index) => {
                let _ = self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Delivers the event to every live subscriber in registration order.
    pub fn publish(&mut self, event: &Event) {
        for subscriber in &mut self.subscribers {
            (subscriber.callback)(event);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
