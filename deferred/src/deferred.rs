use super::*;
use futures::FutureExt;
use futures::future::BoxFuture;

/// A container for at most one eventual value.
///
/// The value travels through a single-slot channel from whoever produces it
/// (a [`Resolver`], [`resolve`], or a [`compose`] link) to the single owner of
/// this handle. Reading consumes the delivery: once a read has returned,
/// every further read returns `None`.
///
/// `None` from a read means "closed without a value". That is how a
/// cancelled link, a failed transform, or an abandoned resolver all look to
/// the reader.
pub struct DeferredValue<T> {
    rx: Option<flume::Receiver<T>>,
}

/// The producing half of a pending [`DeferredValue`].
///
/// Resolving consumes the resolver, so a container can never receive more
/// than one value. Dropping it unresolved closes the container empty.
pub struct Resolver<T> {
    tx: flume::Sender<T>,
}

impl<T> DeferredValue<T> {
    /// Creates a container that already holds `value`.
    pub fn new(value: T) -> Self {
        let (resolver, deferred) = Self::pending();
        // The reader is alive and the slot is empty, so this cannot fail
        _ = resolver.resolve(value);
        deferred
    }

    /// Creates a container that is already closed without a value.
    pub fn empty() -> Self {
        Self { rx: None }
    }

    /// Creates an unresolved container, and the [`Resolver`] that fills it.
    pub fn pending() -> (Resolver<T>, Self) {
        let (tx, rx) = flume::bounded(1);
        (Resolver { tx }, Self::from_receiver(rx))
    }

    pub(crate) fn from_receiver(rx: flume::Receiver<T>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Waits for the value.
    ///
    /// Returns `Some(value)` if one was delivered, or `None` if the container
    /// closed without one or has already been read.
    ///
    /// This future is cancel safe: if it is dropped before completing, no
    /// value is lost and a later read can still receive it.
    pub async fn read(&mut self) -> Option<T> {
        let rx = self.rx.as_ref()?;
        let value = rx.recv_async().await.ok();
        self.rx = None;
        value
    }

    /// Blocks the current thread until the value arrives or the container
    /// closes, with the same contract as [`read`](DeferredValue::read).
    ///
    /// Do not call this from inside an async task.
    pub fn read_blocking(&mut self) -> Option<T> {
        self.rx.take()?.recv().ok()
    }

    /// Returns `true` once a read has returned, whatever its outcome.
    pub fn is_terminated(&self) -> bool {
        self.rx.is_none()
    }
}

impl<T> Resolver<T> {
    /// Delivers `value` to the container.
    ///
    /// Fails, handing the value back, if the container has been dropped.
    pub fn resolve(self, value: T) -> Result<(), T> {
        self.tx.try_send(value).map_err(|e| e.into_inner())
    }

    /// Returns `true` if nobody will ever read the container.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_disconnected()
    }
}

impl<T> Default for DeferredValue<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> core::fmt::Debug for DeferredValue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeferredValue")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl<T> core::fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resolver")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// Awaiting a container reads it once, taking ownership.
impl<T: Send + 'static> core::future::IntoFuture for DeferredValue<T> {
    type Output = Option<T>;
    type IntoFuture = BoxFuture<'static, Option<T>>;

    fn into_future(mut self) -> Self::IntoFuture {
        async move { self.read().await }.boxed()
    }
}

/// Wraps an already known value in a ready container.
///
/// Equivalent to [`DeferredValue::new`].
pub fn resolve<T>(value: T) -> DeferredValue<T> {
    DeferredValue::new(value)
}
