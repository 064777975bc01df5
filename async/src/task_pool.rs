//! Task pool for tracking cancellable tasks with graceful shutdown.
//!
//! This module provides [`TaskPool`], which encapsulates the common pattern of:
//! - Spawning tasks that observe a shared cancellation token
//! - Tracking how many of those tasks are still running
//! - Graceful shutdown with guaranteed task completion
//!
//! # Pattern
//!
//! The task pool implements a three-phase shutdown:
//! 1. **Signal**: Cancel all tasks via the cancellation token
//! 2. **Close**: Mark the tracker closed so waiters can complete
//! 3. **Wait**: Block until all tasks complete
//!
//! # Example
//!
//! ```no_run
//! use relay_async::TaskPool;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let pool = TaskPool::new();
//! let cancel = pool.cancel_token().clone();
//!
//! pool.spawn(async move {
//!     loop {
//!         tokio::select! {
//!             biased;
//!             _ = cancel.cancelled() => break,
//!             _ = do_work() => {}
//!         }
//!     }
//! });
//!
//! assert_eq!(pool.active_tasks(), 1);
//! pool.shutdown().await;
//! assert_eq!(pool.active_tasks(), 0);
//! # });
//!
//! # async fn do_work() {}
//! ```

use crate::CancellationToken;
use crate::join_handle::JoinHandle;

/// Tracks a group of cancellable tasks sharing one [`CancellationToken`].
///
/// `TaskPool` combines a [`CancellationToken`] and
/// [`tokio_util::task::TaskTracker`] to provide a consistent shutdown pattern
/// and an exact count of tasks that have not yet finished.
///
/// # Shutdown Guarantees
///
/// When [`shutdown()`](TaskPool::shutdown) is called:
/// - All tasks are signaled to cancel via the cancellation token
/// - The method blocks until all spawned tasks complete
/// - Tasks can finish their current operation gracefully
#[derive(Debug, Default)]
pub struct TaskPool {
    cancel_token: CancellationToken,
    task_tracker: tokio_util::task::TaskTracker,
}

impl TaskPool {
    /// Creates a new task pool with its own, deadline-free token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a task pool whose tasks observe `cancel_token`.
    pub fn with_token(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            task_tracker: tokio_util::task::TaskTracker::new(),
        }
    }

    /// Returns a reference to the cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Creates a child cancellation token for hierarchical cancellation.
    ///
    /// Child tokens can be cancelled independently without affecting the parent
    /// pool. However, when the parent pool is cancelled, all child tokens are
    /// also cancelled.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Spawns a task tracked by this pool.
    ///
    /// The task is counted by [`active_tasks()`](TaskPool::active_tasks) until
    /// it completes, whether it returns or panics.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: core::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.task_tracker.spawn(task)
    }

    /// Returns the number of spawned tasks that have not yet finished.
    pub fn active_tasks(&self) -> usize {
        self.task_tracker.len()
    }

    /// Waits for every task spawned so far to complete, without cancelling.
    ///
    /// Tasks spawned while waiting are also waited for. The pool stays open
    /// for new tasks afterwards, unless it was cancelled in the meantime.
    pub async fn wait(&self) {
        self.task_tracker.close();
        self.task_tracker.wait().await;

        // A concurrent shutdown closed the tracker for good
        if !self.cancel_token.is_cancelled() {
            self.task_tracker.reopen();
        }
    }

    /// Initiates graceful shutdown and waits for all tasks to complete.
    ///
    /// This method implements the three-phase shutdown pattern:
    /// 1. Cancels all tasks via the cancellation token
    /// 2. Closes the tracker
    /// 3. Waits for all currently running tasks to complete
    ///
    /// Tasks are expected to check the cancellation token and exit gracefully.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }

    /// Checks if shutdown has been requested.
    ///
    /// Returns `true` if [`shutdown()`](TaskPool::shutdown) has been called,
    /// the token was cancelled manually, or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_task_pool_spawn_and_shutdown() {
        let pool = TaskPool::new();
        let cancel = pool.cancel_token().clone();

        let handle = pool.spawn(async move {
            let mut count = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(10)) => {
                        count += 1;
                    }
                }
            }
            count
        });
        assert_eq!(pool.active_tasks(), 1);

        tokio::time::sleep(Duration::from_millis(35)).await;
        pool.shutdown().await;

        assert!(pool.is_cancelled());
        assert_eq!(pool.active_tasks(), 0);
        assert!(handle.await.unwrap() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_does_not_cancel() {
        let pool = TaskPool::new();
        pool.spawn(tokio::time::sleep(Duration::from_secs(1)));
        pool.spawn(tokio::time::sleep(Duration::from_secs(2)));
        assert_eq!(pool.active_tasks(), 2);

        pool.wait().await;
        assert_eq!(pool.active_tasks(), 0);
        assert!(!pool.is_cancelled());

        // Still usable after a wait
        pool.spawn(async {});
        pool.wait().await;
        assert_eq!(pool.active_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_token_stops_pool() {
        let pool = TaskPool::with_token(CancellationToken::expiring_at(
            crate::time::deadline_after(::time::Duration::seconds(1)),
        ));
        let cancel = pool.cancel_token().clone();
        pool.spawn(async move { cancel.cancelled().await });

        pool.wait().await;
        assert!(pool.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_does_not_reopen_after_shutdown() {
        let pool = TaskPool::new();
        let cancel = pool.cancel_token().clone();
        pool.spawn(async move { cancel.cancelled().await });

        // Shutdown lands while wait() is still blocked on the task
        tokio::join!(pool.wait(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            pool.shutdown().await;
        });

        assert!(pool.is_cancelled());
        assert_eq!(pool.active_tasks(), 0);
        assert!(pool.task_tracker.is_closed());
    }

    #[tokio::test]
    async fn test_child_token_independent_cancellation() {
        let pool = TaskPool::new();
        let child = pool.child_token();

        // Cancel child without affecting parent
        child.cancel();

        assert!(child.is_cancelled());
        assert!(!pool.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancels_child() {
        let pool = TaskPool::new();
        let child = pool.child_token();

        pool.shutdown().await;

        assert!(child.is_cancelled());
        assert!(pool.is_cancelled());
    }
}
