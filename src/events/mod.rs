//! Navigation event stream.
//!
//! The navigation loop reports what it did on every tick: successful
//! transitions, redirects and fallbacks, failures, and addresses it gave up
//! on. Subscribers receive these over bounded channels:
//! - Filtering by event kind
//! - Bounded buffers with slow-subscriber dropping
//!
//! # Example
//!
//! ```ignore
//! let handle = navigator.events().subscribe(EventConfig {
//!     filter: EventFilter::failures(),
//!     ..Default::default()
//! });
//!
//! while let Ok(event) = handle.recv() {
//!     match event {
//!         NavigationEvent::Failed { address, error, .. } => eprintln!("{address}: {error}"),
//!         NavigationEvent::Dropped { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::EventManager;
pub use types::{DropReason, EventConfig, EventFilter, EventHandle, NavigationEvent, SubscriberId};
