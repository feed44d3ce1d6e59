//! State -> address generation.

use super::Routes;
use crate::address::Query;
use crate::error::{Result, RouterError};
use crate::types::{normalize_fragment, Target};

/// The relative pieces of a generated address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Generated {
    pub path: String,
    pub query: Query,
}

impl<C> Routes<C> {
    /// Build the path and query for a dotted state name.
    ///
    /// Every level is checked before failing so that missing parameters are
    /// reported for the whole chain at once. Only declared query parameters
    /// are emitted.
    pub(crate) fn generate(&self, target: &Target) -> Result<Generated> {
        let mut routes = Some(self);
        let mut generated = Generated::default();
        let mut missing_path: Vec<String> = Vec::new();
        let mut missing_query: Vec<String> = Vec::new();

        for segment in target.segments() {
            let state = routes
                .and_then(|r| r.get(segment))
                .ok_or_else(|| RouterError::UnknownState {
                    name: segment.to_string(),
                    path: target.name.clone(),
                })?;

            for key in state.path_params() {
                if !target.path_params.contains_key(key) && !missing_path.contains(key) {
                    missing_path.push(key.clone());
                }
            }

            for key in state.query_params() {
                match target.search_params.get(key) {
                    Some(value) => generated.query.set(key, value.clone()),
                    None if !missing_query.contains(key) => missing_query.push(key.clone()),
                    None => {}
                }
            }

            if let Some(fragment) = state.pattern().to_path(&target.path_params) {
                generated.path.push_str(normalize_fragment(&fragment));
            }

            routes = state.children();
        }

        if !missing_path.is_empty() {
            return Err(RouterError::MissingPathParams {
                state: target.name.clone(),
                missing: missing_path,
            });
        }
        if !missing_query.is_empty() {
            return Err(RouterError::MissingQueryParams {
                state: target.name.clone(),
                missing: missing_query,
            });
        }

        Ok(generated)
    }
}
