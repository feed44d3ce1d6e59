//! Handler registry and concurrent dispatch.
//!
//! Handlers are registered against the dotted name of a leaf state. When a
//! transition completes, every handler registered for its name runs
//! concurrently and the dispatch finishes when all of them have.

mod dispatcher;

pub use dispatcher::{Dispatcher, HandlerResult};
