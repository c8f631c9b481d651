//! Thread-affine execution of native calls
//!
//! PDFium is not reentrant across threads: a call made from any thread other
//! than the one that opened the session corrupts memory and takes the process
//! down with an access violation, not a catchable error. Ordinary
//! "run it on a background thread" async patterns (`spawn_blocking`, worker
//! pools) are therefore exactly wrong here.
//!
//! [`run_affine`] is the sanctioned path from async code into the engine. It
//! yields to the scheduler once, so awaiting callers keep cooperative
//! non-blocking semantics, then runs the operation synchronously on whichever
//! thread polls the future. It never performs a thread switch; correctness
//! comes from the caller keeping the future on the session's thread (a
//! current-thread runtime or `LocalSet`), and a debug assertion catches
//! violations early in tests.

use std::thread::{self, ThreadId};
use tracing::error;

/// The thread a native session is bound to, captured when the session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl ThreadAffinity {
    /// Bind to the current thread
    pub fn capture() -> Self {
        Self {
            thread_id: thread::current().id(),
        }
    }

    /// Whether the current thread is the affinity thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Assert the current thread is the affinity thread.
    ///
    /// Panics in debug builds; logs loudly in release builds, where the
    /// native call that follows may crash the process anyway and the log line
    /// is the post-mortem breadcrumb.
    pub fn assert_current(&self) {
        if !self.is_current() {
            error!(
                expected = ?self.thread_id,
                actual = ?thread::current().id(),
                "native call attempted off the session's affinity thread"
            );
            debug_assert!(
                self.is_current(),
                "native call attempted off the session's affinity thread"
            );
        }
    }
}

/// Await-compatible execution of a synchronous native operation without a
/// thread hop.
///
/// Yields control to the scheduler exactly once, then invokes `op` on the
/// polling thread and resolves with its result. The operation is never
/// dispatched to a thread pool. Dropping the returned future before its
/// second poll cancels cleanly (the operation has not started); once `op` is
/// entered it runs to completion inside that poll, because the engine offers
/// no interruption hook.
///
/// A panic inside `op` propagates to the awaiter unchanged.
pub async fn run_affine<T, F>(affinity: ThreadAffinity, op: F) -> T
where
    F: FnOnce() -> T,
{
    tokio::task::yield_now().await;
    affinity.assert_current();
    op()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_on_calling_thread() {
        let affinity = ThreadAffinity::capture();
        let caller = thread::current().id();

        let ran_on = run_affine(affinity, || thread::current().id()).await;

        assert_eq!(ran_on, caller);
    }

    #[tokio::test]
    async fn test_returns_operation_result() {
        let affinity = ThreadAffinity::capture();
        let value = run_affine(affinity, || 6 * 7).await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_propagates_errors_through_result() {
        let affinity = ThreadAffinity::capture();
        let result: Result<(), &str> = run_affine(affinity, || Err("native open failed")).await;
        assert_eq!(result, Err("native open failed"));
    }

    #[tokio::test]
    #[should_panic(expected = "operation panicked")]
    async fn test_propagates_panics_unchanged() {
        let affinity = ThreadAffinity::capture();
        run_affine(affinity, || panic!("operation panicked")).await;
    }

    #[test]
    fn test_affinity_capture_matches_thread() {
        let affinity = ThreadAffinity::capture();
        assert!(affinity.is_current());

        let other = thread::spawn(ThreadAffinity::capture).join().unwrap();
        assert!(!other.is_current());
        assert_ne!(affinity, other);
    }

    #[test]
    fn test_yields_exactly_once_before_running() {
        let affinity = ThreadAffinity::capture();
        let mut future = tokio_test::task::spawn(run_affine(affinity, || 1));

        // First poll hits the single yield point; the operation has not run.
        tokio_test::assert_pending!(future.poll());
        // Second poll runs the operation synchronously and completes.
        assert_eq!(tokio_test::assert_ready!(future.poll()), 1);
    }

    #[test]
    fn test_drop_before_completion_cancels_cleanly() {
        let affinity = ThreadAffinity::capture();
        let ran = std::cell::Cell::new(false);

        let mut future = tokio_test::task::spawn(run_affine(affinity, || ran.set(true)));
        tokio_test::assert_pending!(future.poll());
        drop(future);

        assert!(!ran.get(), "cancelled operation must never start");
    }
}
