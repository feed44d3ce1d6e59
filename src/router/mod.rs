//! The router: address <-> state translation and the active chain.
//!
//! A [`Router`] owns the root sibling list, the routing configuration, the
//! application context and the currently active chain together with its
//! resolved dependencies. It is cheap to clone; clones share all state.
//!
//! - [`Router::address_to_state`] matches an address against the states.
//! - [`Router::state_to_url`] is the inverse, producing an address.
//! - [`Router::transition`] diffs the target chain against the active one,
//!   resolves fresh entries in order and publishes the result.

mod transition;

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Result, RouterError};
use crate::routes::{to_target, ChainEntry, Routes};
use crate::states::StateNode;
use crate::types::{Dependencies, Params, Target};

/// Router configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Match the fragment instead of the path.
    pub fragment_mode: bool,

    /// Absolute origin used when no displayed address is available.
    pub base_address: String,

    /// Prefix for generated addresses in fragment mode.
    pub base_path: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fragment_mode: false,
            base_address: "http://localhost:4000".to_string(),
            base_path: String::new(),
        }
    }
}

/// Result of a completed transition.
pub struct Transition<C> {
    /// Dotted name of the leaf state.
    pub name: String,
    /// Path parameters merged across the chain.
    pub path_params: Params,
    /// Query parameters merged across the chain.
    pub search_params: Params,
    pub context: Arc<C>,
    /// Resolved payloads for every state in the chain, by state name.
    pub dependencies: Dependencies,
    /// Ticket this transition published under.
    pub generation: u64,
}

impl<C> Transition<C> {
    /// The name and parameters of this transition.
    pub fn target(&self) -> Target {
        Target {
            name: self.name.clone(),
            path_params: self.path_params.clone(),
            search_params: self.search_params.clone(),
        }
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path_params: self.path_params.clone(),
            search_params: self.search_params.clone(),
            context: Arc::clone(&self.context),
            dependencies: self.dependencies.clone(),
            generation: self.generation,
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("path_params", &self.path_params)
            .field("search_params", &self.search_params)
            .field("dependencies", &self.dependencies)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Copy of the published chain and dependencies.
pub struct ActiveSnapshot<C> {
    pub chain: Vec<ChainEntry<C>>,
    pub dependencies: Dependencies,
    /// Ticket of the transition that published this pair (0 before the first).
    pub generation: u64,
}

impl<C> ActiveSnapshot<C> {
    /// The active target, or `None` before the first transition.
    pub fn target(&self) -> Option<Target> {
        if self.chain.is_empty() {
            None
        } else {
            Some(to_target(&self.chain))
        }
    }
}

impl<C> fmt::Debug for ActiveSnapshot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSnapshot")
            .field("chain", &self.chain)
            .field("dependencies", &self.dependencies)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Published chain + dependencies. Only ever replaced as a whole.
struct ActiveState<C> {
    chain: Vec<ChainEntry<C>>,
    dependencies: Dependencies,
    generation: u64,
}

struct RouterInner<C> {
    routes: Routes<C>,
    config: RouterConfig,
    context: Arc<C>,
    active: RwLock<ActiveState<C>>,
    /// Last ticket handed out to a transition.
    next_generation: AtomicU64,
}

/// Hierarchical address-to-state router.
pub struct Router<C> {
    inner: Arc<RouterInner<C>>,
}

impl<C> Router<C> {
    /// Create a router over the root sibling list.
    pub fn new(
        context: C,
        config: RouterConfig,
        states: impl IntoIterator<Item = StateNode<C>>,
    ) -> Result<Self> {
        Self::with_shared_context(Arc::new(context), config, states)
    }

    /// Create a router around an already shared context.
    pub fn with_shared_context(
        context: Arc<C>,
        config: RouterConfig,
        states: impl IntoIterator<Item = StateNode<C>>,
    ) -> Result<Self> {
        let routes = Routes::new(states)?;
        Ok(Self {
            inner: Arc::new(RouterInner {
                routes,
                config,
                context,
                active: RwLock::new(ActiveState {
                    chain: Vec::new(),
                    dependencies: Dependencies::new(),
                    generation: 0,
                }),
                next_generation: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    pub fn context(&self) -> &Arc<C> {
        &self.inner.context
    }

    /// The root sibling list.
    pub fn routes(&self) -> &Routes<C> {
        &self.inner.routes
    }

    /// Match an address to a target.
    pub fn address_to_state(&self, address: &str) -> Result<Target> {
        self.match_chain(address).map(|chain| to_target(&chain))
    }

    /// Generate the address for a target.
    ///
    /// In fragment mode the result is `base_path[?query]#path`, otherwise
    /// `path[?query]`.
    pub fn state_to_url(&self, target: &Target) -> Result<String> {
        let generated = self.inner.routes.generate(target)?;
        let config = &self.inner.config;

        let url = match (config.fragment_mode, generated.query.is_empty()) {
            (true, true) => format!("{}#{}", config.base_path, generated.path),
            (true, false) => format!(
                "{}?{}#{}",
                config.base_path,
                generated.query.encode(),
                generated.path
            ),
            (false, true) => generated.path,
            (false, false) => format!("{}?{}", generated.path, generated.query.encode()),
        };
        Ok(url)
    }

    /// Join a relative address onto the configured base address's origin.
    pub fn absolute_address(&self, relative: &str) -> String {
        let base = Address::parse(&self.inner.config.base_address);
        Address::parse(relative)
            .with_origin(base.origin())
            .to_string()
    }

    /// Copy of the active chain and its dependencies.
    pub fn active(&self) -> ActiveSnapshot<C> {
        let active = self.inner.active.read();
        ActiveSnapshot {
            chain: active.chain.clone(),
            dependencies: active.dependencies.clone(),
            generation: active.generation,
        }
    }

    /// The active target, or `None` before the first transition.
    pub fn current(&self) -> Option<Target> {
        let active = self.inner.active.read();
        if active.chain.is_empty() {
            None
        } else {
            Some(to_target(&active.chain))
        }
    }

    /// Dotted name of the active leaf.
    pub fn current_name(&self) -> Option<String> {
        self.current().map(|target| target.name)
    }

    /// Dependencies published with the active chain.
    pub fn dependencies(&self) -> Dependencies {
        self.inner.active.read().dependencies.clone()
    }

    pub(crate) fn match_chain(&self, address: &str) -> Result<Vec<ChainEntry<C>>> {
        let parsed = Address::parse(address);
        self.inner
            .routes
            .match_address(&parsed, self.inner.config.fragment_mode)
            .ok_or_else(|| RouterError::NoStateMatch {
                address: address.to_string(),
            })
    }
}

impl<C> Clone for Router<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.inner.config)
            .field("routes", &self.inner.routes)
            .field("current", &self.current())
            .finish()
    }
}
