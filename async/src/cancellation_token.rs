//! Cancellation tokens with optional deadlines.
//!
//! [`CancellationToken`] wraps `tokio_util::sync::CancellationToken` and adds
//! an optional monotonic deadline. The token fires either when [`cancel()`]
//! is called on any clone (or on its [`CancelHandle`]), or once the deadline
//! has passed, whichever happens first. Firing is idempotent and permanent.
//!
//! No timer task is spawned for a deadline. Waiters race the underlying
//! signal against a sleep until the deadline, and whoever observes the
//! deadline first latches the signal so every other clone sees it too.
//!
//! # Example
//!
//! ```no_run
//! use relay_async::cancellation_token::with_deadline;
//!
//! async fn example() {
//!     let (token, cancel) = with_deadline(time::Duration::seconds(1));
//!
//!     // In another task
//!     let waiter = token.clone();
//!     tokio::spawn(async move {
//!         waiter.cancelled().await;
//!         println!("Cancelled!");
//!     });
//!
//!     // Cancel early, or let the deadline do it
//!     cancel.cancel();
//! }
//! ```
//!
//! [`cancel()`]: CancellationToken::cancel

use crate::time::Instant;
use tracing::trace;

/// A token for cooperative cancellation of async operations.
///
/// Clones share the same signal. Cancelling any clone cancels all of them,
/// and any [child token](CancellationToken::child_token) derived from them.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a token that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that also fires once `deadline` has passed.
    pub fn expiring_at(deadline: Instant) -> Self {
        Self {
            inner: tokio_util::sync::CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Returns the deadline of this token, if it has one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left until the deadline.
    ///
    /// `None` if the token has no deadline. Saturates at zero once the
    /// deadline has passed.
    pub fn remaining(&self) -> Option<core::time::Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fires the token. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns a handle that can fire this token but not observe it.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.inner.clone())
    }

    /// Checks if the token has fired, latching it if the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.is_cancelled() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.expire();
                true
            }
            _ => false,
        }
    }

    /// Completes when the token fires.
    ///
    /// This future is cancel safe: dropping it before completion has no
    /// effect on the token.
    pub async fn cancelled(&self) {
        let Some(deadline) = self.deadline else {
            return self.inner.cancelled().await;
        };
        if self.is_cancelled() {
            return;
        }

        tokio::select! {
            biased;
            _ = self.inner.cancelled() => {}
            _ = crate::time::sleep_until(deadline) => self.expire(),
        }
    }

    /// Creates a child token.
    ///
    /// The child fires when this token fires (including by deadline, which the
    /// child inherits), but cancelling the child does not affect this token.
    pub fn child_token(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
            deadline: self.deadline,
        }
    }

    fn expire(&self) {
        if !self.inner.is_cancelled() {
            trace!("Cancellation deadline reached");
            self.inner.cancel();
        }
    }
}

/// Fires a [`CancellationToken`].
///
/// Returned alongside deadline tokens so that the owner of a chain can stop it
/// before the deadline. Cloning a handle is cheap.
#[derive(Clone, Debug)]
pub struct CancelHandle(tokio_util::sync::CancellationToken);

impl CancelHandle {
    /// Fires the token. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Checks if the token was fired explicitly.
    ///
    /// Deadline expiry is only visible here once a waiter has observed it.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Creates a token that fires after `duration`, and a handle to fire it early.
///
/// Zero or negative durations produce a token that has already expired.
#[cfg(feature = "tokio")]
pub fn with_deadline(duration: ::time::Duration) -> (CancellationToken, CancelHandle) {
    let token = CancellationToken::expiring_at(crate::time::deadline_after(duration));
    let handle = token.cancel_handle();
    (token, handle)
}

/// Creates a token that fires at the wall-clock time `at`, and a handle to fire
/// it early.
///
/// The wall-clock time is converted to a monotonic deadline once, here, so
/// later adjustments of the system clock do not move it.
#[cfg(feature = "tokio")]
pub fn with_deadline_at(at: ::time::OffsetDateTime) -> (CancellationToken, CancelHandle) {
    with_deadline(at - ::time::OffsetDateTime::now_utc())
}
