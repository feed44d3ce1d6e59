//! The navigation loop: polls the address and keeps the router in step.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dispatch::Dispatcher;
use crate::error::{Result, RouterError};
use crate::events::{EventManager, NavigationEvent};
use crate::history::History;
use crate::router::{Router, Transition};
use crate::types::{Redirect, Target};

/// Navigation loop configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Loaded when the address matches no state.
    pub initial: Option<Target>,

    /// Loaded after the retry limit is reached.
    pub error: Option<Target>,

    /// Record the loaded target as the history entry's payload.
    pub use_push: bool,

    /// Consecutive failed attempts before giving up on an address.
    pub retry_limit: u32,

    /// Address polling period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            initial: None,
            error: None,
            use_push: false,
            retry_limit: 4,
            poll_interval_ms: 32,
        }
    }
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The address has not changed since the last tick.
    Unchanged,
    /// The address was resolved and its handlers ran.
    Transitioned { name: String, generation: u64 },
    /// A redirect or the initial target was loaded.
    Loaded { address: String },
    /// A newer transition published first.
    Superseded,
    /// The attempt failed and the address will be retried.
    Retrying { attempt: u32, error: RouterError },
    /// The failure was reported; the address is not retried.
    Reported(RouterError),
    /// The retry limit was reached.
    GaveUp {
        attempts: u32,
        /// Address of the loaded error target, if any.
        fallback: Option<String>,
    },
}

#[derive(Default)]
struct LoopState {
    previous: Option<String>,
    observed: Option<String>,
    attempts: u32,
}

/// Keeps the router in step with the displayed address.
pub struct Navigator<C> {
    router: Router<C>,
    dispatcher: Arc<Dispatcher<C>>,
    history: History,
    config: NavigatorConfig,
    state: Mutex<LoopState>,
    events: EventManager,
}

impl<C> Navigator<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(
        router: Router<C>,
        dispatcher: Arc<Dispatcher<C>>,
        history: History,
        config: NavigatorConfig,
    ) -> Self {
        Self {
            router,
            dispatcher,
            history,
            config,
            state: Mutex::new(LoopState::default()),
            events: EventManager::new(),
        }
    }

    pub fn router(&self) -> &Router<C> {
        &self.router
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
        &self.dispatcher
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Stream of navigation events.
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Consecutive failed attempts on the current address.
    pub fn attempts(&self) -> u32 {
        self.state.lock().attempts
    }

    /// Check the displayed address before the loop starts.
    ///
    /// If it matches no state the initial target is loaded and its address
    /// returned. Without an initial target the error is returned.
    pub fn bootstrap(&self) -> Result<Option<String>> {
        let current = self.history.current();
        let error = match self.router.address_to_state(&current) {
            Ok(_) => return Ok(None),
            Err(error) => error,
        };

        let result = match self.config.initial {
            Some(ref initial) => {
                tracing::info!(address = %current, initial = %initial.name, "Loading initial state");
                self.history
                    .load(&self.router, initial, self.config.use_push)
                    .map(Some)
            }
            None => Err(error),
        };

        if let Err(ref error) = result {
            tracing::error!(address = %current, error = %error, "No state for initial address");
            self.events.broadcast(NavigationEvent::Failed {
                address: current.clone(),
                error: error.to_string(),
                attempt: 0,
            });
        }
        result
    }

    /// Run one step of the loop.
    pub async fn tick(&self) -> TickOutcome {
        let current = self.history.current();
        let limit = self.config.retry_limit;

        let attempts = {
            let mut state = self.state.lock();
            if state.observed.as_deref() == Some(current.as_str()) {
                return TickOutcome::Unchanged;
            }
            if state.attempts < limit {
                state.previous = state.observed.replace(current.clone());
            }
            state.attempts
        };

        if attempts >= limit {
            return self.give_up(&current, attempts);
        }

        match self.attempt(&current).await {
            Ok(transition) => {
                self.state.lock().attempts = 0;
                tracing::debug!(address = %current, name = %transition.name, "Navigated");
                self.events.broadcast(NavigationEvent::Transitioned {
                    address: current,
                    name: transition.name.clone(),
                    generation: transition.generation,
                });
                TickOutcome::Transitioned {
                    name: transition.name,
                    generation: transition.generation,
                }
            }
            Err(error) => self.recover(&current, error),
        }
    }

    /// Tick every `poll_interval_ms` until `shutdown` completes.
    ///
    /// Ticks never overlap: the next one starts after the previous finished.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Navigation loop shutting down");
                    break;
                }
                _ = timer.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Bootstrap and run the loop on a background task.
    pub fn start(self: Arc<Self>) -> NavigatorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            // Failures are logged and broadcast by bootstrap. The loop still
            // runs so a later address change can recover.
            if let Err(error) = self.bootstrap() {
                tracing::debug!(error = %error, "Starting loop after failed bootstrap");
            }
            self.run_until(async {
                let _ = shutdown_rx.await;
            })
            .await;
        });

        NavigatorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn attempt(&self, address: &str) -> Result<Transition<C>> {
        let transition = self.router.transition_to_address(address).await?;
        self.dispatcher.handle(&self.router, &transition).await?;
        Ok(transition)
    }

    fn recover(&self, address: &str, error: RouterError) -> TickOutcome {
        if let Some(redirect) = error.redirect() {
            return self.follow_redirect(address, redirect.clone());
        }

        // Without an initial target a miss is retried like any other failure.
        if let (true, Some(initial)) = (error.is_not_found(), self.config.initial.as_ref()) {
            return match self.load(initial) {
                Ok(to) => {
                    tracing::info!(address = %address, initial = %initial.name, "No state matched, loading initial state");
                    self.events.broadcast(NavigationEvent::FellBack {
                        address: address.to_string(),
                        target: initial.clone(),
                        to: to.clone(),
                    });
                    TickOutcome::Loaded { address: to }
                }
                Err(load_error) => self.report(address, load_error),
            };
        }

        if let RouterError::Superseded { generation, .. } = error {
            tracing::debug!(address = %address, generation, "Transition superseded");
            return TickOutcome::Superseded;
        }

        let attempt = {
            let mut state = self.state.lock();
            state.observed = state.previous.take();
            state.attempts += 1;
            state.attempts
        };

        tracing::error!(address = %address, attempt, error = %error, "Navigation attempt failed");
        self.events.broadcast(NavigationEvent::Failed {
            address: address.to_string(),
            error: error.to_string(),
            attempt,
        });
        TickOutcome::Retrying { attempt, error }
    }

    fn follow_redirect(&self, address: &str, redirect: Redirect) -> TickOutcome {
        let target = match redirect {
            Redirect::State(ref target) => target.clone(),
            Redirect::Address(ref to) => match self.router.address_to_state(to) {
                Ok(target) => target,
                Err(error) => {
                    return match self.config.initial {
                        Some(ref initial) => match self.load(initial) {
                            Ok(to) => TickOutcome::Loaded { address: to },
                            Err(load_error) => self.report(address, load_error),
                        },
                        None => self.report(address, error),
                    };
                }
            },
        };

        match self.load(&target) {
            Ok(to) => {
                tracing::info!(address = %address, redirect = %redirect, "Following redirect");
                self.events.broadcast(NavigationEvent::Redirected {
                    address: address.to_string(),
                    redirect,
                    to: to.clone(),
                });
                TickOutcome::Loaded { address: to }
            }
            Err(error) => self.report(address, error),
        }
    }

    fn give_up(&self, address: &str, attempts: u32) -> TickOutcome {
        // Not retried again until the address changes.
        {
            let mut state = self.state.lock();
            state.attempts = 0;
            state.previous = state.observed.replace(address.to_string());
        }

        let fallback = match self.config.error {
            Some(ref error) => match self.load(error) {
                Ok(to) => Some(to),
                Err(load_error) => {
                    tracing::error!(address = %address, error = %load_error, "Failed to load error state");
                    None
                }
            },
            None => {
                let error = RouterError::RetriesExhausted {
                    address: address.to_string(),
                    attempts,
                };
                tracing::error!(error = %error, "Giving up on address");
                None
            }
        };

        if let Some(ref to) = fallback {
            tracing::warn!(address = %address, attempts, fallback = %to, "Giving up on address, loading error state");
        }

        self.events.broadcast(NavigationEvent::GaveUp {
            address: address.to_string(),
            attempts,
            fallback: fallback.as_ref().and(self.config.error.clone()),
        });
        TickOutcome::GaveUp { attempts, fallback }
    }

    fn report(&self, address: &str, error: RouterError) -> TickOutcome {
        let attempt = self.state.lock().attempts;
        tracing::error!(address = %address, error = %error, "Navigation failed");
        self.events.broadcast(NavigationEvent::Failed {
            address: address.to_string(),
            error: error.to_string(),
            attempt,
        });
        TickOutcome::Reported(error)
    }

    fn load(&self, target: &Target) -> Result<String> {
        self.history.load(&self.router, target, self.config.use_push)
    }
}

/// Handle to a navigation loop started with [`Navigator::start`].
pub struct NavigatorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl NavigatorHandle {
    /// Stop the loop and wait for it to finish its current tick.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Navigation loop task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
