//! Tracked composition under one cancellation token.
//!
//! A [`Scope`] owns the token of a chain and the pool every link task is
//! spawned into, so the owner can see how many links are still running, how
//! many gave up because of cancellation, and wait for all of them to finish.
//!
//! # Example
//!
//! ```
//! use relay_deferred::{Scope, resolve};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let scope = Scope::with_deadline(time::Duration::seconds(30));
//!
//! let m = scope.compose(resolve(1), |x| resolve(x + 1));
//! let m = scope.map(m, |x| x * 10);
//! assert_eq!(m.await, Some(20));
//!
//! scope.shutdown_within(core::time::Duration::from_secs(1)).await.unwrap();
//! assert_eq!(scope.active_tasks(), 0);
//! # });
//! ```

use super::*;
use core::fmt::Display;
use core::future::Future;
use core::sync::atomic::{AtomicUsize, Ordering};
use relay_async::TaskPool;

#[derive(Debug, Default)]
pub(crate) struct Stats {
    cancelled: AtomicUsize,
    failed: AtomicUsize,
}

impl Stats {
    pub(crate) fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Delivered | Outcome::Exhausted | Outcome::Abandoned => {}
        }
    }
}

/// A cancellation token plus the tasks composed under it.
#[derive(Debug)]
pub struct Scope {
    tasks: TaskPool,
    stats: Arc<Stats>,
    grace_period: core::time::Duration,
}

impl Scope {
    /// Creates a scope whose links observe `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            tasks: TaskPool::with_token(token),
            stats: Arc::default(),
            grace_period: config::DEFAULT_GRACE_PERIOD,
        }
    }

    /// Creates a scope whose token fires after `duration`.
    pub fn with_deadline(duration: ::time::Duration) -> Self {
        let (token, _) = relay_async::cancellation_token::with_deadline(duration);
        Self::new(token)
    }

    /// Creates a scope from configuration.
    ///
    /// A deadline too large to represent is treated as never expiring.
    pub fn from_config(config: &config::Config) -> Self {
        let token = match config.deadline {
            Some(deadline) => {
                CancellationToken::expiring_at(relay_async::time::instant_after(deadline))
            }
            None => CancellationToken::new(),
        };
        Self::with_config(token, config)
    }

    /// Creates a scope whose links observe `token`, taking everything but the
    /// deadline from `config`.
    pub fn with_config(token: CancellationToken, config: &config::Config) -> Self {
        Self {
            grace_period: config.grace_period,
            ..Self::new(token)
        }
    }

    pub(crate) fn tasks(&self) -> &TaskPool {
        &self.tasks
    }

    pub(crate) fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    /// The token shared by every link of this scope.
    pub fn token(&self) -> &CancellationToken {
        self.tasks.cancel_token()
    }

    /// Fires the token, stopping every link that has not yet delivered.
    pub fn cancel(&self) {
        self.token().cancel();
    }

    /// The grace period used by [`shutdown()`](Scope::shutdown).
    pub fn grace_period(&self) -> core::time::Duration {
        self.grace_period
    }

    /// Tracked form of [`compose()`](crate::compose()).
    pub fn compose<T, U, F>(&self, source: DeferredValue<T>, transform: F) -> DeferredValue<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> DeferredValue<U> + Send + 'static,
    {
        self.try_compose(source, move |value| {
            Ok::<_, core::convert::Infallible>(transform(value))
        })
    }

    /// Tracked form of [`try_compose()`](crate::try_compose()).
    pub fn try_compose<T, U, F, E>(&self, source: DeferredValue<T>, transform: F) -> DeferredValue<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Result<DeferredValue<U>, E> + Send + 'static,
        E: Display + Send + 'static,
    {
        compose::bind(compose::Spawner::Scope(self), self.token(), source, transform)
    }

    /// Tracked form of [`map()`](crate::map()).
    pub fn map<T, U, F>(&self, source: DeferredValue<T>, f: F) -> DeferredValue<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.compose(source, move |value| resolve(f(value)))
    }

    /// Tracked form of [`spawn()`](crate::spawn()).
    pub fn spawn<T, Fut>(&self, future: Fut) -> DeferredValue<T>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        compose::produce(compose::Spawner::Scope(self), self.token(), future)
    }

    /// The number of tasks spawned through this scope that are still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks.active_tasks()
    }

    /// The number of tasks that stopped because the token fired.
    pub fn cancellations(&self) -> usize {
        self.stats.cancelled.load(Ordering::Relaxed)
    }

    /// The number of links whose transform returned an error.
    pub fn failures(&self) -> usize {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Waits for every task to finish on its own, without cancelling.
    pub async fn wait(&self) {
        self.tasks.wait().await
    }

    /// Cancels every link and waits up to the configured grace period for them
    /// to finish.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.shutdown_within(self.grace_period).await
    }

    /// Cancels every link and waits up to `grace` for them to finish.
    ///
    /// Returns [`Error::Leaked`] if any task is still running afterwards.
    #[cfg_attr(feature = "instrument", instrument(skip(self)))]
    pub async fn shutdown_within(&self, grace: core::time::Duration) -> Result<(), Error> {
        if relay_async::time::timeout(grace, self.tasks.shutdown())
            .await
            .is_some()
        {
            debug!(cancellations = self.cancellations(), "Scope shut down");
            return Ok(());
        }

        let remaining = self.active_tasks();
        error!("{remaining} task(s) still running after {grace:?} grace period");
        Err(Error::Leaked { remaining })
    }
}
