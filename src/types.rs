//! Core types for the router.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named parameter values (path or query).
pub type Params = BTreeMap<String, String>;

/// Resolved dependency payloads keyed by state name.
pub type Dependencies = BTreeMap<String, serde_json::Value>;

/// A fully-qualified state together with its parameters.
///
/// This is both what `address_to_state` produces and what callers hand to
/// `state_to_url` / `transition`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Dot-joined state name, root first (e.g. `"users.detail"`).
    pub name: String,
    #[serde(default)]
    pub path_params: Params,
    #[serde(default)]
    pub search_params: Params,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a path parameter.
    pub fn path(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_params.insert(key.into(), value.into());
        self
    }

    /// Name segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Name of the leaf state.
    pub fn leaf(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={} pathParams={:?} searchParams={:?}",
            self.name, self.path_params, self.search_params
        )
    }
}

/// Explicit fallback carried by a failed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "to", rename_all = "snake_case")]
pub enum Redirect {
    /// Navigate to a named state.
    State(Target),
    /// Navigate to an address.
    Address(String),
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::State(target) => write!(f, "state {}", target),
            Redirect::Address(address) => write!(f, "address \"{}\"", address),
        }
    }
}

/// Strip a single trailing slash unless the string is exactly `"/"`.
pub(crate) fn normalize_fragment(fragment: &str) -> &str {
    if fragment.len() > 1 {
        fragment.strip_suffix('/').unwrap_or(fragment)
    } else {
        fragment
    }
}
