//! Error types for the router.

use crate::types::{Redirect, Target};
use thiserror::Error;

/// Boxed error produced by application resolvers and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for routing operations.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No state matches address \"{address}\"")]
    NoStateMatch { address: String },

    #[error("Invalid transition: {target} (address \"{address}\")")]
    TransitionNotFound { target: Target, address: String },

    #[error("State \"{name}\" does not exist in \"{path}\"")]
    UnknownState { name: String, path: String },

    #[error("Path parameters {missing:?} missing for state \"{state}\"")]
    MissingPathParams { state: String, missing: Vec<String> },

    #[error("Query parameters {missing:?} missing for state \"{state}\"")]
    MissingQueryParams { state: String, missing: Vec<String> },

    #[error("Dependencies for state \"{state}\" failed to resolve: {source}")]
    DependencyResolution {
        state: String,
        #[source]
        source: BoxError,
    },

    #[error("Handler for state \"{state}\" failed: {source}")]
    Dispatch {
        state: String,
        #[source]
        source: BoxError,
    },

    #[error("Redirect to {0}")]
    Redirect(Redirect),

    #[error("Invalid path pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid state name: \"{0}\"")]
    InvalidStateName(String),

    #[error("Duplicate state name in sibling list or chain: {0}")]
    DuplicateState(String),

    #[error("Parameter \"{param}\" of state \"{state}\" is already declared by an ancestor")]
    DuplicateParam { state: String, param: String },

    #[error("Transition to \"{name}\" superseded (generation {generation})")]
    Superseded { name: String, generation: u64 },

    #[error("State failed to load for \"{address}\" after {attempts} attempts")]
    RetriesExhausted { address: String, attempts: u32 },
}

impl RouterError {
    /// Address or name did not lead to any state.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RouterError::NoStateMatch { .. } | RouterError::TransitionNotFound { .. }
        )
    }

    /// The explicit fallback carried by this error, if any.
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            RouterError::Redirect(redirect) => Some(redirect),
            _ => None,
        }
    }
}

/// Failure returned by a dependency resolver or a dispatch handler.
#[derive(Debug)]
pub enum Rejection {
    /// Abandon the transition and navigate somewhere else.
    Redirect(Redirect),
    /// The resolver or handler failed.
    Failed(BoxError),
}

impl Rejection {
    /// Wrap any error as a failure.
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Rejection::Failed(error.into())
    }

    /// Redirect to a named state.
    pub fn to_state(target: Target) -> Self {
        Rejection::Redirect(Redirect::State(target))
    }

    /// Redirect to an address.
    pub fn to_address(address: impl Into<String>) -> Self {
        Rejection::Redirect(Redirect::Address(address.into()))
    }

    pub(crate) fn into_resolution_error(self, state: &str) -> RouterError {
        match self {
            Rejection::Redirect(redirect) => RouterError::Redirect(redirect),
            Rejection::Failed(source) => RouterError::DependencyResolution {
                state: state.to_string(),
                source,
            },
        }
    }

    pub(crate) fn into_dispatch_error(self, state: &str) -> RouterError {
        match self {
            Rejection::Redirect(redirect) => RouterError::Redirect(redirect),
            Rejection::Failed(source) => RouterError::Dispatch {
                state: state.to_string(),
                source,
            },
        }
    }
}

impl From<Redirect> for Rejection {
    fn from(redirect: Redirect) -> Self {
        Rejection::Redirect(redirect)
    }
}

impl From<RouterError> for Rejection {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Redirect(redirect) => Rejection::Redirect(redirect),
            other => Rejection::Failed(Box::new(other)),
        }
    }
}

impl From<serde_json::Error> for Rejection {
    fn from(e: serde_json::Error) -> Self {
        Rejection::Failed(Box::new(e))
    }
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RouterError>;
