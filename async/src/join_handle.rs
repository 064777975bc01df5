//! JoinHandle abstraction for runtime-agnostic task handles.
//!
//! Currently wraps `tokio::task::JoinHandle`. When another runtime is
//! supported, this will be feature-gated to provide the appropriate handle type.
//!
//! # Example
//!
//! ```no_run
//! use relay_async::JoinHandle;
//!
//! async fn example() {
//!     let pool = relay_async::TaskPool::new();
//!     let handle: JoinHandle<i32> = pool.spawn(async { 42 });
//!     let result = handle.await.unwrap();
//!     assert_eq!(result, 42);
//! }
//! ```

/// A handle to a spawned task that can be awaited for its result.
#[cfg(feature = "tokio")]
pub type JoinHandle<T> = tokio::task::JoinHandle<T>;
