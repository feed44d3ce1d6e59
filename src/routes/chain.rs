//! Chain entries: one matched state with its own parameters.

use std::fmt;
use std::sync::Arc;

use crate::states::StateNode;
use crate::types::{Params, Target};

/// One step of a matched chain, root to leaf.
pub struct ChainEntry<C> {
    pub state: Arc<StateNode<C>>,
    pub path_params: Params,
    pub search_params: Params,
}

impl<C> ChainEntry<C> {
    /// Whether this entry can reuse `previous`'s resolved payload.
    ///
    /// Requires the identical node and equal values for every declared path
    /// and query parameter.
    pub fn carries_over(&self, previous: &ChainEntry<C>) -> bool {
        if !Arc::ptr_eq(&self.state, &previous.state) {
            return false;
        }

        let path_equal = self
            .state
            .path_params()
            .iter()
            .all(|key| self.path_params.get(key) == previous.path_params.get(key));

        let search_equal = self
            .state
            .query_params()
            .iter()
            .all(|key| self.search_params.get(key) == previous.search_params.get(key));

        path_equal && search_equal
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }
}

impl<C> Clone for ChainEntry<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            path_params: self.path_params.clone(),
            search_params: self.search_params.clone(),
        }
    }
}

impl<C> fmt::Debug for ChainEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainEntry")
            .field("state", &self.state.name())
            .field("path_params", &self.path_params)
            .field("search_params", &self.search_params)
            .finish()
    }
}

/// Collapse a chain into its dotted name and merged parameters.
///
/// Later (deeper) entries win when parameter names collide.
pub(crate) fn to_target<C>(chain: &[ChainEntry<C>]) -> Target {
    let mut target = Target::new(
        chain
            .iter()
            .map(ChainEntry::name)
            .collect::<Vec<_>>()
            .join("."),
    );

    for entry in chain {
        target.path_params.extend(entry.path_params.clone());
        target.search_params.extend(entry.search_params.clone());
    }

    target
}
