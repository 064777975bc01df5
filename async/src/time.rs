//! Time utilities for runtime-agnostic async operations.
//!
//! Durations are expressed with the signed [`time::Duration`], so callers can
//! pass "already elapsed" values without special casing.
//!
//! # Example
//!
//! ```no_run
//! use relay_async::time::sleep;
//! use time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! // Sleep for 5 seconds
//! sleep(Duration::seconds(5)).await;
//!
//! // Negative durations return immediately
//! sleep(Duration::seconds(-1)).await;  // No-op
//! # });
//! ```

/// A monotonic point in time, as used by the runtime's timers.
#[cfg(feature = "tokio")]
pub type Instant = tokio::time::Instant;

/// Converts a signed duration to a std duration, clamping at the ends.
///
/// - Zero or negative durations become [`std::time::Duration::ZERO`]
/// - Durations exceeding `std::time::Duration::MAX` become `MAX`
pub fn to_std(duration: ::time::Duration) -> core::time::Duration {
    if !duration.is_positive() {
        return core::time::Duration::ZERO;
    }
    duration.try_into().unwrap_or(core::time::Duration::MAX)
}

/// Returns the instant `duration` from now, saturating far in the future.
#[cfg(feature = "tokio")]
pub fn deadline_after(duration: ::time::Duration) -> Instant {
    instant_after(to_std(duration))
}

/// Unsigned form of [`deadline_after`].
#[cfg(feature = "tokio")]
pub fn instant_after(duration: core::time::Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        // Roughly 30 years, which is what tokio itself treats as "never"
        .unwrap_or_else(|| now + core::time::Duration::from_secs(86_400 * 365 * 30))
}

/// Sleeps for the specified duration.
///
/// # Behavior
///
/// - Positive durations: sleeps for the specified time
/// - Zero or negative durations: returns immediately without sleeping
/// - Durations exceeding `std::time::Duration::MAX`: sleeps for `MAX`
#[cfg(feature = "tokio")]
pub async fn sleep(duration: ::time::Duration) {
    if !duration.is_positive() {
        return;
    }

    tokio::time::sleep(to_std(duration)).await;
}

/// Sleeps until the specified instant; returns immediately if it has passed.
#[cfg(feature = "tokio")]
pub async fn sleep_until(deadline: Instant) {
    tokio::time::sleep_until(deadline).await;
}

/// Runs `future` to completion unless `duration` elapses first.
///
/// Returns `None` on timeout, in which case `future` has been dropped.
#[cfg(feature = "tokio")]
pub async fn timeout<F: core::future::Future>(duration: core::time::Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(duration, future).await.ok()
}
