//! Single-value deferred containers, chained under cooperative cancellation.
//!
//! A [`DeferredValue`] holds at most one eventual value. [`resolve`] wraps a
//! value that is already known; [`compose`] chains a transform onto a
//! container by spawning one task that waits for the upstream value, applies
//! the transform, and forwards the transform's own result, racing every step
//! against a shared [`CancellationToken`].
//!
//! Cancellation is not an error here: a link that observes the token closes
//! its output without a value, so the reader at the end of the chain simply
//! gets `None`. Whenever the token and a value become ready at the same time,
//! the token wins.
//!
//! ```
//! use relay_deferred::{compose, resolve, spawn};
//! use relay_async::cancellation_token::with_deadline;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
//! let (token, _cancel) = with_deadline(time::Duration::seconds(1));
//!
//! let slow = compose(&token, resolve(1), {
//!     let token = token.clone();
//!     move |x| {
//!         spawn(&token, async move {
//!             tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!             x + 1
//!         })
//!     }
//! });
//!
//! // The deadline passes before the transform finishes
//! assert_eq!(slow.await, None);
//! # });
//! ```

mod compose;
mod deferred;

pub mod config;
pub mod scope;

use std::sync::Arc;
use tracing::{debug, error, trace, warn};

#[cfg(feature = "instrument")]
use tracing::instrument;

pub use compose::{Outcome, compose, map, spawn, try_compose};
pub use deferred::{DeferredValue, Resolver, resolve};
pub use relay_async::cancellation_token::{with_deadline, with_deadline_at};
pub use relay_async::{CancelHandle, CancellationToken};
pub use scope::Scope;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{remaining} task(s) did not finish within the grace period")]
    Leaked { remaining: usize },
}

/// Registers descriptions for the metrics emitted by composed links.
///
/// Call once after installing a `metrics` recorder. Without a recorder the
/// counters are no-ops.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "relay_compose_delivered",
        metrics::Unit::Count,
        "Total number of values forwarded by composed links"
    );
    metrics::describe_counter!(
        "relay_compose_cancelled",
        metrics::Unit::Count,
        "Total number of links that observed cancellation before delivering"
    );
    metrics::describe_counter!(
        "relay_compose_failed",
        metrics::Unit::Count,
        "Total number of links whose transform returned an error"
    );
}
