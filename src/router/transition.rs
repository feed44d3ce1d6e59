//! Chain diffing, sequential dependency resolution and publication.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::{ActiveState, Router, Transition};
use crate::error::{Result, RouterError};
use crate::routes::{to_target, ChainEntry};
use crate::states::Resolve;
use crate::types::{Dependencies, Target};

impl<C> Router<C>
where
    C: Send + Sync + 'static,
{
    /// Transition to a named state.
    ///
    /// The target is turned into an address and matched back, so named and
    /// address-driven transitions always agree on the chain.
    pub async fn transition(&self, target: &Target) -> Result<Transition<C>> {
        let address = self.state_to_url(target)?;
        let chain = match self.match_chain(&address) {
            Ok(chain) => chain,
            Err(_) => {
                return Err(RouterError::TransitionNotFound {
                    target: target.clone(),
                    address,
                })
            }
        };
        self.apply(chain).await
    }

    /// Transition to whatever state an address matches.
    pub async fn transition_to_address(&self, address: &str) -> Result<Transition<C>> {
        let chain = self.match_chain(address)?;
        self.apply(chain).await
    }

    async fn apply(&self, chain: Vec<ChainEntry<C>>) -> Result<Transition<C>> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (previous, previous_dependencies) = {
            let active = self.inner.active.read();
            (active.chain.clone(), active.dependencies.clone())
        };

        // Carried-over payloads seed the mapping; everything else is fresh.
        let mut dependencies = Dependencies::new();
        let mut fresh: Vec<&ChainEntry<C>> = Vec::new();
        for (position, entry) in chain.iter().enumerate() {
            let carried = previous
                .get(position)
                .filter(|old| entry.carries_over(old))
                .and_then(|_| previous_dependencies.get(entry.name()));

            match carried {
                Some(payload) => {
                    dependencies.insert(entry.name().to_string(), payload.clone());
                }
                None => fresh.push(entry),
            }
        }

        tracing::debug!(
            generation,
            chain = chain.len(),
            fresh = fresh.len(),
            "Resolving transition"
        );

        for entry in fresh {
            let args = Resolve {
                router: self.clone(),
                context: Arc::clone(&self.inner.context),
                dependencies: dependencies.clone(),
                state: Arc::clone(&entry.state),
                path_params: entry.path_params.clone(),
                search_params: entry.search_params.clone(),
            };

            let payload = entry
                .state
                .resolve(args)
                .await
                .map_err(|rejection| rejection.into_resolution_error(entry.name()))?;
            dependencies.insert(entry.name().to_string(), payload);
        }

        let target = to_target(&chain);

        {
            let mut active = self.inner.active.write();
            if active.generation > generation {
                tracing::debug!(
                    name = %target.name,
                    generation,
                    published = active.generation,
                    "Discarding superseded transition"
                );
                return Err(RouterError::Superseded {
                    name: target.name,
                    generation,
                });
            }
            *active = ActiveState {
                chain,
                dependencies: dependencies.clone(),
                generation,
            };
        }

        tracing::debug!(name = %target.name, generation, "Transition published");

        Ok(Transition {
            name: target.name,
            path_params: target.path_params,
            search_params: target.search_params,
            context: Arc::clone(&self.inner.context),
            dependencies,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use crate::router::RouterConfig;
    use crate::states::StateNode;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::AtomicU64;

    /// Counts resolver invocations per state.
    #[derive(Default)]
    struct Calls {
        parent: AtomicU64,
        child: AtomicU64,
    }

    fn counting_router() -> Router<Calls> {
        Router::new(
            Calls::default(),
            RouterConfig::default(),
            vec![StateNode::builder("users", "/users")
                .query(["tab"])
                .resolve(|args: Resolve<Calls>| async move {
                    args.context.parent.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Rejection>(json!({"tab": args.search_params.get("tab")}))
                })
                .child(
                    StateNode::builder("detail", "/:id")
                        .resolve(|args: Resolve<Calls>| async move {
                            args.context.child.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, Rejection>(json!(args.path_params.get("id")))
                        })
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap()],
        )
        .unwrap()
    }

    // --- Diffing ---

    #[tokio::test]
    async fn test_carried_over_entries_are_not_resolved_again() {
        let router = counting_router();
        let calls = Arc::clone(router.context());

        router
            .transition(&Target::new("users.detail").path("id", "1").query("tab", "a"))
            .await
            .unwrap();
        let transition = router
            .transition(&Target::new("users.detail").path("id", "2").query("tab", "a"))
            .await
            .unwrap();

        assert_eq!(calls.parent.load(Ordering::SeqCst), 1);
        assert_eq!(calls.child.load(Ordering::SeqCst), 2);
        assert_eq!(transition.dependencies["users"], json!({"tab": "a"}));
        assert_eq!(transition.dependencies["detail"], json!("2"));
    }

    #[tokio::test]
    async fn test_changed_query_param_refreshes_entry() {
        let router = counting_router();
        let calls = Arc::clone(router.context());

        router
            .transition_to_address("/users/1?tab=a")
            .await
            .unwrap();
        let transition = router
            .transition_to_address("/users/1?tab=b")
            .await
            .unwrap();

        assert_eq!(calls.parent.load(Ordering::SeqCst), 2);
        // The child sits under a fresh parent at the same position but its own
        // parameters did not change.
        assert_eq!(calls.child.load(Ordering::SeqCst), 1);
        assert_eq!(transition.dependencies["users"], json!({"tab": "b"}));
    }

    #[tokio::test]
    async fn test_dependencies_only_cover_active_chain() {
        let router = counting_router();

        router.transition_to_address("/users/1?tab=a").await.unwrap();
        let transition = router.transition_to_address("/users?tab=a").await.unwrap();

        assert_eq!(transition.name, "users");
        assert!(transition.dependencies.contains_key("users"));
        assert!(!transition.dependencies.contains_key("detail"));
        assert_eq!(router.dependencies(), transition.dependencies);
    }

    // --- Resolution order ---

    #[tokio::test]
    async fn test_fresh_entries_resolve_in_order() {
        let seen: Arc<Mutex<Vec<Dependencies>>> = Arc::default();

        let record = |name: &'static str, seen: Arc<Mutex<Vec<Dependencies>>>| {
            move |args: Resolve<()>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().push(args.dependencies.clone());
                    Ok::<_, Rejection>(json!(name))
                }
            }
        };

        let router = Router::new(
            (),
            RouterConfig::default(),
            vec![StateNode::builder("a", "/a")
                .resolve(record("a", Arc::clone(&seen)))
                .child(
                    StateNode::builder("b", "/b")
                        .resolve(record("b", Arc::clone(&seen)))
                        .child(
                            StateNode::builder("c", "/c")
                                .resolve(record("c", Arc::clone(&seen)))
                                .build()
                                .unwrap(),
                        )
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap()],
        )
        .unwrap();

        let transition = router.transition(&Target::new("a.b.c")).await.unwrap();
        assert_eq!(transition.name, "a.b.c");

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].get("a"), Some(&json!("a")));
        assert_eq!(seen[2].get("a"), Some(&json!("a")));
        assert_eq!(seen[2].get("b"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_resolver_can_read_router() {
        let router = Router::new(
            (),
            RouterConfig::default(),
            vec![StateNode::builder("where", "/where")
                .resolve(|args: Resolve<()>| async move {
                    let url = args.router.state_to_url(&Target::new("where"))?;
                    Ok::<_, Rejection>(json!(url))
                })
                .build()
                .unwrap()],
        )
        .unwrap();

        let transition = router.transition(&Target::new("where")).await.unwrap();
        assert_eq!(transition.dependencies["where"], json!("/where"));
    }

    // --- Failures ---

    #[tokio::test]
    async fn test_failed_resolution_keeps_previous_chain() {
        let router = Router::new(
            (),
            RouterConfig::default(),
            vec![
                StateNode::builder("home", "/").build().unwrap(),
                StateNode::builder("broken", "/broken")
                    .resolve(|_: Resolve<()>| async { Err::<serde_json::Value, _>(Rejection::failed("backend down")) })
                    .build()
                    .unwrap(),
                StateNode::builder("moved", "/moved")
                    .resolve(|_: Resolve<()>| async {
                        Err::<serde_json::Value, _>(Rejection::to_state(Target::new("home")))
                    })
                    .build()
                    .unwrap(),
            ],
        )
        .unwrap();

        router.transition(&Target::new("home")).await.unwrap();

        let err = router.transition(&Target::new("broken")).await.unwrap_err();
        assert!(matches!(err, RouterError::DependencyResolution { ref state, .. } if state == "broken"));

        let err = router.transition(&Target::new("moved")).await.unwrap_err();
        assert_eq!(err.redirect(), Some(&crate::types::Redirect::State(Target::new("home"))));

        assert_eq!(router.current(), Some(Target::new("home")));
    }

    #[tokio::test]
    async fn test_transition_not_found() {
        let router = Router::new(
            (),
            RouterConfig::default(),
            vec![StateNode::builder("file", "/files/:name").build().unwrap()],
        )
        .unwrap();

        // Generates "/files/a/b", which the unconstrained parameter cannot match.
        let err = router
            .transition(&Target::new("file").path("name", "a/b"))
            .await
            .unwrap_err();
        match err {
            RouterError::TransitionNotFound { target, address } => {
                assert_eq!(target.name, "file");
                assert_eq!(address, "/files/a/b");
            }
            other => panic!("Expected TransitionNotFound, got {:?}", other),
        }
    }

    // --- Overlapping transitions ---

    #[tokio::test]
    async fn test_stale_completion_is_superseded() {
        let router = Router::new(
            tokio::sync::Notify::new(),
            RouterConfig::default(),
            vec![
                StateNode::builder("slow", "/slow")
                    .resolve(|args: Resolve<tokio::sync::Notify>| async move {
                        args.context.notified().await;
                        Ok::<_, Rejection>(json!("slow"))
                    })
                    .build()
                    .unwrap(),
                StateNode::builder("fast", "/fast").build().unwrap(),
            ],
        )
        .unwrap();

        let slow_target = Target::new("slow");
        let mut slow = Box::pin(router.transition(&slow_target));
        assert!(futures::poll!(&mut slow).is_pending());

        let fast = router.transition(&Target::new("fast")).await.unwrap();
        router.context().notify_one();

        let err = slow.await.unwrap_err();
        assert!(matches!(err, RouterError::Superseded { ref name, generation: 1 } if name == "slow"));

        let active = router.active();
        assert_eq!(active.generation, fast.generation);
        assert_eq!(active.target(), Some(Target::new("fast")));
    }
}
