//! Per-state handler registry and concurrent dispatch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::RwLock;

use crate::error::{Rejection, Result};
use crate::router::{Router, Transition};
use crate::states::BoxFuture;

/// Outcome of a dispatch handler.
pub type HandlerResult = std::result::Result<(), Rejection>;

/// Type-erased handler function stored in the registry.
///
/// Takes owned values so the returned future can be `'static`:
/// - `Router<C>`: the router that produced the transition
/// - `Arc<Transition<C>>`: the completed transition, shared by all handlers
type Handler<C> = Arc<dyn Fn(Router<C>, Arc<Transition<C>>) -> BoxFuture<HandlerResult> + Send + Sync>;

/// Registry mapping dotted state names to handlers.
pub struct Dispatcher<C> {
    handlers: RwLock<HashMap<String, Vec<Handler<C>>>>,
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Append a handler for the dotted state name `name`.
    pub fn register<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Router<C>, Arc<Transition<C>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: Handler<C> = Arc::new(
            move |router: Router<C>, transition: Arc<Transition<C>>| -> BoxFuture<HandlerResult> {
                Box::pin(handler(router, transition))
            },
        );
        self.handlers.write().entry(name.into()).or_default().push(handler);
    }

    /// Number of handlers registered for `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.read().get(name).map_or(0, Vec::len)
    }

    /// Run every handler registered for the transition's state.
    ///
    /// Handlers run concurrently with identical arguments. The first failure
    /// ends the dispatch. No handlers is not an error.
    pub async fn handle(&self, router: &Router<C>, transition: &Transition<C>) -> Result<()> {
        let handlers: Vec<Handler<C>> = self
            .handlers
            .read()
            .get(&transition.name)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::debug!(name = %transition.name, "No handlers registered");
            return Ok(());
        }

        tracing::debug!(
            name = %transition.name,
            handlers = handlers.len(),
            "Dispatching transition"
        );

        let shared = Arc::new(transition.clone());
        let tasks = handlers
            .iter()
            .map(|handler| handler(router.clone(), Arc::clone(&shared)));

        try_join_all(tasks)
            .await
            .map_err(|rejection| rejection.into_dispatch_error(&transition.name))?;
        Ok(())
    }
}

impl<C> Default for Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut names: Vec<(&String, usize)> =
            handlers.iter().map(|(name, list)| (name, list.len())).collect();
        names.sort();
        f.debug_struct("Dispatcher").field("handlers", &names).finish()
    }
}
