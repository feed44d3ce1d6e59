//! Address -> chain matching.

use std::sync::Arc;

use super::{ChainEntry, Routes};
use crate::address::{Address, Query};
use crate::states::StateNode;
use crate::types::{normalize_fragment, Params};

/// A state that accepted the front of the working address.
struct Step<'a, C> {
    entry: ChainEntry<C>,
    /// Unconsumed path (or fragment) text.
    rest: &'a str,
}

impl<C> Routes<C> {
    /// Match an address against this sibling list and its descendants.
    ///
    /// In fragment mode the fragment text is matched instead of the path.
    /// Returns the chain root to leaf, or `None` if nothing matched.
    pub(crate) fn match_address(
        &self,
        address: &Address,
        fragment_mode: bool,
    ) -> Option<Vec<ChainEntry<C>>> {
        let mut routes = self;
        let mut remaining = address.clone();
        let mut chain = Vec::new();

        'levels: loop {
            let text = if fragment_mode {
                remaining.fragment().unwrap_or("").to_string()
            } else {
                remaining.path().to_string()
            };

            for state in routes.states() {
                let Some(step) = match_step(state, &text, remaining.query()) else {
                    continue;
                };

                if step.rest.is_empty() {
                    chain.push(step.entry);
                    return Some(chain);
                }

                // Committed: no fallback to later siblings from here on.
                let children = state.children()?;
                let rest = rooted(step.rest);
                for key in state.query_params() {
                    remaining.query_mut().remove(key);
                }
                if fragment_mode {
                    remaining.set_fragment(Some(rest));
                } else {
                    remaining.set_path(&rest);
                }

                chain.push(step.entry);
                routes = children;
                continue 'levels;
            }

            return None;
        }
    }
}

/// Try one state against the working text.
///
/// A leaf only accepts if it consumes everything; a state with children may
/// leave a remainder for them.
fn match_step<'a, C>(state: &Arc<StateNode<C>>, text: &'a str, query: &Query) -> Option<Step<'a, C>> {
    let path_params = state.pattern().captures(text)?;

    if !state.query_params().iter().all(|key| query.contains(key)) {
        return None;
    }
    let search_params: Params = state
        .query_params()
        .iter()
        .filter_map(|key| query.get(key).map(|v| (key.clone(), v.to_string())))
        .collect();

    let literal = state.pattern().to_path(&path_params)?;
    let literal = normalize_fragment(&literal);
    let rest = text.strip_prefix(literal)?;

    // The consumed text must end on a segment boundary.
    if !rest.is_empty() && !rest.starts_with('/') && !literal.ends_with('/') {
        return None;
    }

    if !rest.is_empty() && state.is_leaf() {
        return None;
    }

    Some(Step {
        entry: ChainEntry {
            state: Arc::clone(state),
            path_params,
            search_params,
        },
        rest,
    })
}

fn rooted(rest: &str) -> String {
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}
