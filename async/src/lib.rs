//! Runtime-agnostic async primitives for relay.
//!
//! This crate provides abstractions over async runtime primitives to enable
//! potential future support for alternative runtimes (smol, Embassy, etc.)
//! while currently using tokio.
//!
//! # Features
//!
//! - **CancellationToken**: Broadcast cancellation with an optional deadline
//! - **TaskPool**: Tracks cancellable tasks with graceful shutdown
//! - **JoinHandle**: Abstracted task handle type for runtime portability
//!
//! # Example
//!
//! ```no_run
//! use relay_async::{TaskPool, cancellation_token::with_deadline};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (token, _cancel) = with_deadline(time::Duration::seconds(5));
//! let pool = TaskPool::with_token(token.clone());
//!
//! pool.spawn(async move {
//!     loop {
//!         tokio::select! {
//!             biased;
//!             _ = token.cancelled() => break,
//!             _ = do_work() => {}
//!         }
//!     }
//! });
//!
//! pool.shutdown().await;
//! # });
//!
//! # async fn do_work() {}
//! ```

mod spawn;

#[cfg(feature = "tokio")]
pub mod cancellation_token;
pub mod join_handle;
#[cfg(feature = "tokio")]
pub mod task_pool;
pub mod time;

// Re-export commonly used types at crate root
#[cfg(feature = "tokio")]
pub use cancellation_token::{CancelHandle, CancellationToken};
#[cfg(feature = "tokio")]
pub use join_handle::JoinHandle;
#[cfg(feature = "tokio")]
pub use task_pool::TaskPool;
