//! Event types for the navigation stream.

use serde::{Deserialize, Serialize};

use crate::types::{Redirect, Target};

/// Configuration for a subscriber.
#[derive(Clone, Debug)]
pub struct EventConfig {
    /// Max buffered events before the subscriber is dropped.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: EventFilter,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: EventFilter::all(),
        }
    }
}

/// Which events a subscriber receives.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// Completed transitions.
    pub include_transitions: bool,

    /// Redirects and fallbacks to a configured target.
    pub include_redirects: bool,

    /// Failed attempts and abandoned addresses.
    pub include_failures: bool,
}

impl EventFilter {
    pub fn transitions() -> Self {
        Self {
            include_transitions: true,
            ..Default::default()
        }
    }

    pub fn redirects() -> Self {
        Self {
            include_redirects: true,
            ..Default::default()
        }
    }

    pub fn failures() -> Self {
        Self {
            include_failures: true,
            ..Default::default()
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            include_transitions: true,
            include_redirects: true,
            include_failures: true,
        }
    }

    pub(crate) fn matches(&self, event: &NavigationEvent) -> bool {
        match event {
            NavigationEvent::Transitioned { .. } => self.include_transitions,
            NavigationEvent::Redirected { .. } | NavigationEvent::FellBack { .. } => {
                self.include_redirects
            }
            NavigationEvent::Failed { .. } | NavigationEvent::GaveUp { .. } => {
                self.include_failures
            }
            NavigationEvent::Dropped { .. } => true,
        }
    }
}

/// Events emitted by the navigation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    // --- Success ---
    /// The address was resolved and its handlers ran.
    Transitioned {
        address: String,
        name: String,
        generation: u64,
    },

    // --- Recovery ---
    /// A resolver or handler redirected elsewhere.
    Redirected {
        address: String,
        redirect: Redirect,
        /// Address that was loaded.
        to: String,
    },

    /// The address matched nothing; the initial target was loaded.
    FellBack {
        address: String,
        target: Target,
        to: String,
    },

    // --- Failure ---
    /// One attempt failed and will be retried.
    Failed {
        address: String,
        error: String,
        attempt: u32,
    },

    /// The retry limit was reached for this address.
    GaveUp {
        address: String,
        attempts: u32,
        /// Error target that was loaded, if configured.
        fallback: Option<Target>,
    },

    // --- Lifecycle ---
    /// Subscriber was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscriber was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Handle to receive navigation events.
pub struct EventHandle {
    pub id: SubscriberId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<NavigationEvent>,
}

impl EventHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<NavigationEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<NavigationEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<NavigationEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<NavigationEvent> {
        self.receiver.try_iter().collect()
    }
}
