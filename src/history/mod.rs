//! Session history.
//!
//! The displayed address and its history live outside the router. They are
//! reached through the [`AddressSource`] capability; [`MemoryHistory`] is an
//! in-process implementation. [`History`] wraps a source with the push /
//! replace helpers used by the navigation loop and by application code.

mod memory;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::error::Result;
use crate::router::Router;
use crate::types::Target;

pub use memory::{HistoryEntry, MemoryHistory};

/// How a new address enters the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Add a new entry after the current one.
    Push,
    /// Overwrite the current entry.
    Replace,
}

/// Read and change the displayed address.
pub trait AddressSource: Send + Sync {
    /// The currently displayed address.
    fn current(&self) -> String;

    /// Display `address`, attaching `payload` to the history entry.
    fn set(&self, address: &str, mode: HistoryMode, payload: Option<Value>);
}

/// Options for [`History::navigate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigateOptions {
    /// Overwrite the current entry instead of adding one.
    pub replace: bool,
    /// Record a payload with the entry.
    pub push: bool,
    /// Payload to record. Defaults to the matched target, or `{}`.
    pub payload: Option<Value>,
}

/// Push/replace helpers over an address source.
#[derive(Clone)]
pub struct History {
    source: Arc<dyn AddressSource>,
}

impl History {
    pub fn new(source: Arc<dyn AddressSource>) -> Self {
        Self { source }
    }

    /// The currently displayed address.
    pub fn current(&self) -> String {
        self.source.current()
    }

    /// Add an entry for `address`.
    pub fn push(&self, address: &str) {
        self.source.set(address, HistoryMode::Push, None);
    }

    /// Overwrite the current entry with `address`.
    pub fn replace(&self, address: &str) {
        self.source.set(address, HistoryMode::Replace, None);
    }

    /// Change the displayed address.
    ///
    /// With `options.push` a payload is recorded: the explicit one, else the
    /// state `router` matches for the address, else an empty object.
    pub fn navigate<C>(&self, address: &str, options: NavigateOptions, router: Option<&Router<C>>) {
        let mode = if options.replace {
            HistoryMode::Replace
        } else {
            HistoryMode::Push
        };

        let payload = if options.push {
            let payload = options
                .payload
                .or_else(|| {
                    router
                        .and_then(|router| router.address_to_state(address).ok())
                        .and_then(|target| serde_json::to_value(target).ok())
                })
                .unwrap_or_else(|| Value::Object(Default::default()));
            Some(payload)
        } else {
            None
        };

        tracing::debug!(address, ?mode, "Navigating");
        self.source.set(address, mode, payload);
    }

    /// Replace the current entry with the address of `target`.
    ///
    /// The displayed origin is kept; path, query and fragment come from the
    /// generated address. With `use_push` the target is recorded as payload.
    pub fn load<C>(&self, router: &Router<C>, target: &Target, use_push: bool) -> Result<String> {
        let generated = router.state_to_url(target)?;
        let current = Address::parse(&self.source.current());

        let address = match current.origin() {
            Some(origin) => Address::parse(&generated).with_origin(Some(origin)).to_string(),
            None => router.absolute_address(&generated),
        };

        let payload = if use_push {
            Some(serde_json::to_value(target).unwrap_or(Value::Null))
        } else {
            None
        };

        tracing::debug!(name = %target.name, address = %address, "Loading state");
        self.source.set(&address, HistoryMode::Replace, payload);
        Ok(address)
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("current", &self.source.current())
            .finish()
    }
}
