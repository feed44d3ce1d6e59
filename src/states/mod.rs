//! Addressable states.
//!
//! A [`StateNode`] names one application state, the path pattern it answers
//! to, the query parameters it requires, and how its data is resolved. Nodes
//! with children delegate the rest of the address to a nested sibling list.

mod node;

pub use node::{BoxFuture, Resolve, ResolveResult, StateNode, StateNodeBuilder};
