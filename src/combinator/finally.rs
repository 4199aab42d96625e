//! Finally combinator: completion-propagating cleanup.
//!
//! [`finally`] attaches a cleanup action to an outcome-producing operation
//! so that the cleanup runs exactly once no matter how the operation
//! concluded, mirroring a finally-block in imperative code. The combined
//! outcome follows a strict precedence rule:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ operation outcome │ cleanup result │ combined outcome           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Completed(v)      │ Ok(())         │ Completed(v)               │
//! │ Canceled(r)       │ Ok(())         │ Canceled(r)                │
//! │ Failed(errs)      │ Ok(())         │ Failed(errs)  (unchanged)  │
//! │ any               │ Err(e)         │ Failed([e])   (overrides)  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cleanup failure always wins: releasing a resource going wrong is worth
//! surfacing even when the operation itself succeeded or was canceled. When
//! cleanup succeeds, the original outcome is reproduced verbatim — same
//! value, same cancel reason, same error collection, never wrapped.
//!
//! # Ordering
//!
//! Cleanup runs strictly after the operation's terminal outcome is observed
//! and strictly before the returned future resolves. If the operation was
//! already terminal when `finally` was called, cleanup still runs at the
//! first poll of the returned future, never inline during the call itself.
//! Chained links run their cleanups innermost-first as each link resolves.
//!
//! # State Machine
//!
//! `Pending -> {operation terminal} -> CleanupRunning -> Resolved`, with
//! `Resolved` absorbing: polling a resolved combinator again is a no-op
//! (it neither panics nor re-runs cleanup).

use crate::types::Outcome;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Attaches a cleanup action to an outcome-producing operation.
///
/// The returned future resolves once both the operation and the cleanup
/// action have run; its outcome follows the precedence rule documented at
/// the [module level](self). Works identically for value-producing
/// (`Outcome<T, E>`) and valueless (`Outcome<(), E>`) operations.
///
/// # Example
///
/// ```
/// use asyncext::test_utils::block_on;
/// use asyncext::{finally, Handle, Outcome};
///
/// let handle = Handle::<i32, &str>::completed(42);
/// let outcome = block_on(finally(handle, || Ok(())));
/// assert_eq!(outcome, Outcome::Completed(42));
/// ```
pub fn finally<Op, F, T, E>(operation: Op, cleanup: F) -> Finally<Op, F>
where
    Op: Future<Output = Outcome<T, E>>,
    F: FnOnce() -> Result<(), E>,
{
    Finally {
        operation,
        cleanup: Some(cleanup),
        resolved: false,
    }
}

pin_project! {
    /// Future returned by [`finally`].
    ///
    /// Awaitable exactly like the operation it wraps; chaining another
    /// [`finally`] on top composes as expected.
    #[must_use = "combinators do nothing unless polled"]
    pub struct Finally<Op, F> {
        #[pin]
        operation: Op,
        cleanup: Option<F>,
        resolved: bool,
    }
}

impl<Op, F, T, E> Future for Finally<Op, F>
where
    Op: Future<Output = Outcome<T, E>>,
    F: FnOnce() -> Result<(), E>,
{
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if *this.resolved {
            // Absorbing terminal state: never a second cleanup run.
            return Poll::Pending;
        }

        match this.operation.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(outcome) => {
                *this.resolved = true;
                let settled = match this.cleanup.take() {
                    Some(cleanup) => settle(outcome, cleanup()),
                    None => outcome,
                };
                Poll::Ready(settled)
            }
        }
    }
}

/// Combines the operation's outcome with the cleanup result.
fn settle<T, E>(outcome: Outcome<T, E>, cleanup: Result<(), E>) -> Outcome<T, E> {
    match cleanup {
        Ok(()) => outcome,
        Err(error) => {
            tracing::debug!("cleanup failed; overriding original outcome");
            Outcome::failed(error)
        }
    }
}

/// Extension methods for outcome-producing futures.
pub trait HandleExt<T, E>: Future<Output = Outcome<T, E>> + Sized {
    /// Method form of [`finally`].
    ///
    /// ```
    /// use asyncext::test_utils::block_on;
    /// use asyncext::{Handle, HandleExt, Outcome};
    ///
    /// let handle = Handle::<(), &str>::completed(());
    /// let outcome = block_on(handle.finally(|| Err("cleanup broke")));
    /// assert_eq!(outcome, Outcome::failed("cleanup broke"));
    /// ```
    fn finally<F>(self, cleanup: F) -> Finally<Self, F>
    where
        F: FnOnce() -> Result<(), E>,
    {
        finally(self, cleanup)
    }
}

impl<Fut, T, E> HandleExt<T, E> for Fut where Fut: Future<Output = Outcome<T, E>> {}
