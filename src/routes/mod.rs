//! Sibling lists of states and the address <-> state translation.
//!
//! A [`Routes`] value is an ordered list of sibling [`StateNode`]s. Matching
//! walks the list in declaration order and the first state that accepts the
//! address wins. Once a non-terminal state has consumed its prefix the match
//! is committed to it: if its children cannot account for the rest of the
//! address the whole match fails rather than trying the next sibling.

mod chain;
mod generation;
mod matching;

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::states::StateNode;

pub use chain::ChainEntry;
pub(crate) use chain::to_target;

/// An ordered list of sibling states.
pub struct Routes<C> {
    states: Vec<Arc<StateNode<C>>>,
}

impl<C> Routes<C> {
    /// Build a sibling list. Names must be unique.
    pub fn new(states: impl IntoIterator<Item = StateNode<C>>) -> Result<Self> {
        let mut list: Vec<Arc<StateNode<C>>> = Vec::new();
        for state in states {
            if list.iter().any(|s| s.name() == state.name()) {
                return Err(RouterError::DuplicateState(state.name().to_string()));
            }
            list.push(Arc::new(state));
        }
        Ok(Self { states: list })
    }

    /// States in match order.
    pub fn states(&self) -> &[Arc<StateNode<C>>] {
        &self.states
    }

    /// Look up a sibling by name.
    pub fn get(&self, name: &str) -> Option<&Arc<StateNode<C>>> {
        self.states.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<C> Clone for Routes<C> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
        }
    }
}

impl<C> fmt::Debug for Routes<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.states.iter()).finish()
    }
}
