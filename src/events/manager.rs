//! Event manager for broadcasting navigation events.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{DropReason, EventConfig, EventHandle, NavigationEvent, SubscriberId};

/// Internal subscriber state.
struct Subscriber {
    config: EventConfig,
    sender: Sender<NavigationEvent>,
}

impl Subscriber {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: NavigationEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// Manages subscribers and broadcasts events.
pub struct EventManager {
    /// Active subscribers by ID.
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    /// Counter for generating subscriber IDs.
    next_id: AtomicU64,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a subscriber.
    pub fn subscribe(&self, config: EventConfig) -> EventHandle {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.subscribers
            .write()
            .insert(id, Subscriber { config, sender });

        EventHandle { id, receiver }
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if let Some(sub) = self.subscribers.write().remove(&id) {
            // Best effort
            let _ = sub.sender.try_send(NavigationEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Send an event to every subscriber whose filter accepts it.
    ///
    /// Subscribers that cannot take the event are dropped.
    pub fn broadcast(&self, event: NavigationEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscribers.read();
            for (id, sub) in subs.iter() {
                if sub.config.filter.matches(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscribers.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::warn!(subscriber = id.0, "Dropping slow event subscriber");
                    // Might fail, that's ok
                    let _ = sub.sender.try_send(NavigationEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
