//! # Waypoint
//!
//! A hierarchical router that maps addresses (path, query, fragment) onto
//! named, nested application states and keeps the active state in step with
//! the displayed address.
//!
//! ## Core Concepts
//!
//! - **States**: Named nodes with a path pattern, required query parameters,
//!   optional children and a dependency resolver
//! - **Router**: Address to state, state to address, and diff-based
//!   transitions that resolve fresh states in order
//! - **Dispatcher**: Concurrent per-state handlers run after a transition
//! - **Navigator**: Polling loop with retry and fallback policy
//!
//! ## Example
//!
//! ```ignore
//! use waypoint::{Router, RouterConfig, StateNode, Target};
//!
//! let router = Router::new(
//!     AppContext::default(),
//!     RouterConfig::default(),
//!     vec![
//!         StateNode::builder("home", "/").build()?,
//!         StateNode::builder("user", "/users/:id")
//!             .resolve(|args| async move { load_user(&args.path_params["id"]).await })
//!             .build()?,
//!     ],
//! )?;
//!
//! assert_eq!(router.address_to_state("/users/42")?, Target::new("user").path("id", "42"));
//! assert_eq!(router.state_to_url(&Target::new("user").path("id", "42"))?, "/users/42");
//!
//! let transition = router.transition(&Target::new("user").path("id", "42")).await?;
//! ```

pub mod address;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod history;
pub mod navigation;
pub mod pattern;
pub mod router;
pub mod routes;
pub mod states;
pub mod types;

// Re-exports
pub use address::{Address, Query};
pub use dispatch::{Dispatcher, HandlerResult};
pub use error::{BoxError, Rejection, Result, RouterError};
pub use events::{
    DropReason, EventConfig, EventFilter, EventHandle, EventManager, NavigationEvent, SubscriberId,
};
pub use history::{AddressSource, History, HistoryEntry, HistoryMode, MemoryHistory, NavigateOptions};
pub use navigation::{Navigator, NavigatorConfig, NavigatorHandle, TickOutcome};
pub use pattern::PathPattern;
pub use router::{ActiveSnapshot, Router, RouterConfig, Transition};
pub use routes::{ChainEntry, Routes};
pub use states::{BoxFuture, Resolve, ResolveResult, StateNode, StateNodeBuilder};
pub use types::*;
