use super::*;
use core::convert::Infallible;
use core::fmt::Display;
use core::future::Future;

/// How a single link of a chain finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The link forwarded its value downstream.
    Delivered,
    /// The upstream or inner container closed without a value.
    Exhausted,
    /// The token fired before the link could deliver.
    Cancelled,
    /// The transform returned an error.
    Failed,
    /// The reader of the link's output went away before delivery.
    Abandoned,
}

/// Where link tasks are spawned.
#[derive(Clone, Copy)]
pub(crate) enum Spawner<'a> {
    Runtime,
    Scope(&'a scope::Scope),
}

impl Spawner<'_> {
    pub(crate) fn spawn<F>(&self, task: F) -> relay_async::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self {
            Self::Runtime => tokio::spawn(task),
            Self::Scope(scope) => scope.tasks().spawn(task),
        }
    }

    fn stats(&self) -> Option<Arc<scope::Stats>> {
        match self {
            Self::Runtime => None,
            Self::Scope(scope) => Some(scope.stats().clone()),
        }
    }
}

fn cancelled() -> Outcome {
    debug!("Link cancelled before delivery");
    metrics::counter!("relay_compose_cancelled").increment(1);
    Outcome::Cancelled
}

/// Drives one link: wait for `source`, apply `transform`, forward the result.
///
/// Every wait is raced against `token`, with the token polled first so that
/// cancellation wins when both are ready at once.
async fn link<T, U, F, E>(
    token: CancellationToken,
    mut source: DeferredValue<T>,
    transform: F,
    tx: flume::Sender<U>,
) -> Outcome
where
    F: FnOnce(T) -> Result<DeferredValue<U>, E>,
    E: Display,
{
    let value = tokio::select! {
        biased;
        _ = token.cancelled() => return cancelled(),
        value = source.read() => value,
    };
    let Some(value) = value else {
        trace!("Upstream closed without a value");
        return Outcome::Exhausted;
    };

    let mut inner = match transform(value) {
        Ok(inner) => inner,
        Err(e) => {
            warn!("Transform failed, closing link: {e}");
            metrics::counter!("relay_compose_failed").increment(1);
            return Outcome::Failed;
        }
    };

    let mut outcome = Outcome::Exhausted;
    loop {
        let value = tokio::select! {
            biased;
            _ = token.cancelled() => return cancelled(),
            value = inner.read() => value,
        };
        let Some(value) = value else {
            break;
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => return cancelled(),
            r = tx.send_async(value) => if r.is_err() {
                trace!("Link output dropped by its reader");
                return Outcome::Abandoned;
            }
        }
        metrics::counter!("relay_compose_delivered").increment(1);
        outcome = Outcome::Delivered;
    }
    outcome
}

pub(crate) fn bind<T, U, F, E>(
    spawner: Spawner<'_>,
    token: &CancellationToken,
    source: DeferredValue<T>,
    transform: F,
) -> DeferredValue<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> Result<DeferredValue<U>, E> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = flume::bounded(1);
    let token = token.clone();
    let stats = spawner.stats();

    relay_async::spawn!(spawner, "compose_link", async move {
        let outcome = link(token, source, transform, tx).await;
        if let Some(stats) = stats {
            stats.record(outcome);
        }
        outcome
    });

    DeferredValue::from_receiver(rx)
}

pub(crate) fn produce<T, Fut>(
    spawner: Spawner<'_>,
    token: &CancellationToken,
    future: Fut,
) -> DeferredValue<T>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let (resolver, deferred) = DeferredValue::pending();
    let token = token.clone();
    let stats = spawner.stats();

    relay_async::spawn!(spawner, "deferred_task", async move {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => cancelled(),
            value = future => match resolver.resolve(value) {
                Ok(()) => Outcome::Delivered,
                Err(_) => Outcome::Abandoned,
            },
        };
        if let Some(stats) = stats {
            stats.record(outcome);
        }
        outcome
    });

    deferred
}

/// Chains `transform` onto `source`.
///
/// Spawns one task that waits for `source` to deliver, applies `transform` to
/// the value, and forwards whatever the resulting container delivers to the
/// returned container. If `token` fires first, at any point, the task stops
/// and the returned container closes without a value. If `source` closes
/// empty, `transform` is never called.
///
/// Chains are associative: `compose(&t, compose(&t, m, f), g)` reads the same
/// as `compose(&t, m, move |x| compose(&t2, f(x), g))`, with `t2` a clone of
/// `t` moved into the closure.
///
/// A panicking `transform` closes the returned container empty, exactly as
/// cancellation does.
///
/// ```
/// use relay_deferred::{compose, resolve};
/// use relay_async::cancellation_token::with_deadline;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let (token, _cancel) = with_deadline(time::Duration::minutes(1));
///
/// let m1 = resolve(1);
/// let m2 = compose(&token, m1, |x| resolve(x + 1));
/// let m3 = compose(&token, m2, |x| resolve(x + 1));
///
/// assert_eq!(m3.await, Some(3));
/// # });
/// ```
pub fn compose<T, U, F>(
    token: &CancellationToken,
    source: DeferredValue<T>,
    transform: F,
) -> DeferredValue<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> DeferredValue<U> + Send + 'static,
{
    bind(Spawner::Runtime, token, source, move |value| {
        Ok::<_, Infallible>(transform(value))
    })
}

/// Like [`compose`], but `transform` may fail.
///
/// A failure is logged and the returned container closes without a value,
/// indistinguishable to the reader from cancellation.
pub fn try_compose<T, U, F, E>(
    token: &CancellationToken,
    source: DeferredValue<T>,
    transform: F,
) -> DeferredValue<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> Result<DeferredValue<U>, E> + Send + 'static,
    E: Display + Send + 'static,
{
    bind(Spawner::Runtime, token, source, transform)
}

/// Applies a plain function to the value of `source`.
pub fn map<T, U, F>(token: &CancellationToken, source: DeferredValue<T>, f: F) -> DeferredValue<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
{
    compose(token, source, move |value| resolve(f(value)))
}

/// Runs `future` in its own task and delivers its output.
///
/// If `token` fires first the future is dropped and the container closes
/// without a value.
pub fn spawn<T, Fut>(token: &CancellationToken, future: Fut) -> DeferredValue<T>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    produce(Spawner::Runtime, token, future)
}

impl<T: Send + 'static> DeferredValue<T> {
    /// Method form of [`compose`].
    pub fn and_then<U, F>(self, token: &CancellationToken, transform: F) -> DeferredValue<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> DeferredValue<U> + Send + 'static,
    {
        compose(token, self, transform)
    }

    /// Method form of [`map`].
    pub fn map<U, F>(self, token: &CancellationToken, f: F) -> DeferredValue<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        map(token, self, f)
    }
}
