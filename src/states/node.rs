//! State node definition and builder.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::{Rejection, Result, RouterError};
use crate::pattern::PathPattern;
use crate::router::Router;
use crate::routes::Routes;
use crate::types::{Dependencies, Params};

/// A boxed, `Send`-able future returned by resolvers and handlers.
pub type BoxFuture<T> = futures::future::BoxFuture<'static, T>;

/// Outcome of a dependency resolver.
pub type ResolveResult = std::result::Result<serde_json::Value, Rejection>;

/// Type-erased resolver stored in a node.
///
/// Takes owned arguments so the returned future can be `'static`.
type Resolver<C> = Arc<dyn Fn(Resolve<C>) -> BoxFuture<ResolveResult> + Send + Sync>;

/// Arguments handed to a dependency resolver.
pub struct Resolve<C> {
    /// The router running the transition, for issuing further transitions.
    pub router: Router<C>,
    /// Shared application context.
    pub context: Arc<C>,
    /// Payloads resolved so far in this transition, by state name.
    pub dependencies: Dependencies,
    /// The state being resolved.
    pub state: Arc<StateNode<C>>,
    /// This state's own path parameters.
    pub path_params: Params,
    /// This state's own query parameters.
    pub search_params: Params,
}

impl<C> fmt::Debug for Resolve<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolve")
            .field("state", &self.state.name())
            .field("dependencies", &self.dependencies)
            .field("path_params", &self.path_params)
            .field("search_params", &self.search_params)
            .finish()
    }
}

/// One named, addressable state.
pub struct StateNode<C> {
    name: String,
    pattern: PathPattern,
    query: Vec<String>,
    children: Option<Routes<C>>,
    resolver: Option<Resolver<C>>,
}

impl<C> StateNode<C> {
    /// Start building a state answering to `pattern`.
    pub fn builder(name: impl Into<String>, pattern: impl Into<String>) -> StateNodeBuilder<C> {
        StateNodeBuilder {
            name: name.into(),
            pattern: pattern.into(),
            query: Vec::new(),
            children: Vec::new(),
            resolver: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Required path parameters, in pattern order.
    pub fn path_params(&self) -> &[String] {
        self.pattern.params()
    }

    /// Required query parameters.
    pub fn query_params(&self) -> &[String] {
        &self.query
    }

    /// Nested states, if this node is non-terminal.
    pub fn children(&self) -> Option<&Routes<C>> {
        self.children.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Run this state's resolver. States without one resolve to `null`.
    pub(crate) fn resolve(&self, args: Resolve<C>) -> BoxFuture<ResolveResult>
    where
        C: 'static,
    {
        match self.resolver {
            Some(ref resolver) => resolver(args),
            None => Box::pin(async { Ok(serde_json::Value::Null) }),
        }
    }
}

impl<C> fmt::Debug for StateNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("name", &self.name)
            .field("pattern", &self.pattern.source())
            .field("query", &self.query)
            .field("children", &self.children)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Builder for [`StateNode`].
pub struct StateNodeBuilder<C> {
    name: String,
    pattern: String,
    query: Vec<String>,
    children: Vec<StateNode<C>>,
    resolver: Option<Resolver<C>>,
}

impl<C> StateNodeBuilder<C> {
    /// Declare required query parameters.
    pub fn query<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.extend(params.into_iter().map(Into::into));
        self
    }

    /// Add a nested state.
    pub fn child(mut self, child: StateNode<C>) -> Self {
        self.children.push(child);
        self
    }

    /// Add nested states, keeping their order.
    pub fn children(mut self, children: impl IntoIterator<Item = StateNode<C>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the dependency resolver.
    pub fn resolve<F, Fut>(mut self, resolver: F) -> Self
    where
        C: 'static,
        F: Fn(Resolve<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        let resolver: Resolver<C> =
            Arc::new(move |args: Resolve<C>| -> BoxFuture<ResolveResult> { Box::pin(resolver(args)) });
        self.resolver = Some(resolver);
        self
    }

    /// Validate and build the node.
    pub fn build(self) -> Result<StateNode<C>> {
        if self.name.is_empty() || self.name.contains('.') {
            return Err(RouterError::InvalidStateName(self.name));
        }

        let pattern = PathPattern::parse(&self.pattern)?;

        let mut query: Vec<String> = Vec::with_capacity(self.query.len());
        for param in self.query {
            if !query.contains(&param) {
                query.push(param);
            }
        }

        let children = if self.children.is_empty() {
            None
        } else {
            let routes = Routes::new(self.children)?;
            check_descendants(&self.name, pattern.params(), &query, &routes)?;
            Some(routes)
        };

        Ok(StateNode {
            name: self.name,
            pattern,
            query,
            children,
            resolver: self.resolver,
        })
    }
}

/// Dependencies and merged parameters are keyed by short name, so nothing
/// below a state may reuse its name or any of its parameter names.
fn check_descendants<C>(
    name: &str,
    path: &[String],
    query: &[String],
    routes: &Routes<C>,
) -> Result<()> {
    for state in routes.states() {
        if state.name() == name {
            return Err(RouterError::DuplicateState(name.to_string()));
        }

        let reused = state
            .path_params()
            .iter()
            .find(|p| path.contains(*p))
            .or_else(|| state.query_params().iter().find(|q| query.contains(*q)));
        if let Some(param) = reused {
            return Err(RouterError::DuplicateParam {
                state: state.name().to_string(),
                param: param.clone(),
            });
        }

        if let Some(children) = state.children() {
            check_descendants(name, path, query, children)?;
        }
    }
    Ok(())
}
