//! Timer-driven navigation loop.
//!
//! A [`Navigator`] polls the displayed address. When it changes, the loop
//! transitions the router to it and dispatches the handlers of the new
//! state. Failures are recovered according to their kind:
//! - redirects load the redirect target
//! - addresses matching no state load the initial target
//! - everything else is retried, up to the retry limit, after which the
//!   error target is loaded

mod navigator;

pub use navigator::{Navigator, NavigatorConfig, NavigatorHandle, TickOutcome};
