//! Write-once handle/resolver pair.
//!
//! A [`Handle`] observes an asynchronous computation that settles to exactly
//! one terminal [`Outcome`], irreversibly. The paired [`Resolver`] is the
//! only write capability: whoever creates the pair decides who resolves it,
//! downstream consumers can only observe.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      HANDLE / RESOLVER PAIR                      │
//! │                                                                  │
//! │   Resolver                                Handle (any number     │
//! │     │                                     of clones)             │
//! │     │─ complete(v) ─► Completed(v) ──────► .await / peek()       │
//! │     │─ cancel(r) ───► Canceled(r)  ──────► on_terminal(f)        │
//! │     │─ fail(e) ─────► Failed([e])         (each fires once)      │
//! │     │                                                            │
//! │   (drop) ───────────► Canceled(resolver dropped)                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Resolution Semantics
//!
//! The strict forms (`complete`, `cancel`, `fail`) report a duplicate write
//! as [`ResolveError::AlreadyResolved`]. The `try_*` forms are idempotent:
//! the first write wins and later calls are no-ops returning `false`. Both
//! families funnel through [`Resolver::resolve`]/[`Resolver::try_resolve`],
//! so outcome classification lives in one place regardless of whether the
//! handle carries a value.
//!
//! # Observation
//!
//! A handle is a multi-observer future: clones can be awaited independently
//! and each observer receives the terminal outcome (which is why awaiting
//! requires `T: Clone, E: Clone`). Continuations attached with
//! [`Handle::on_terminal`] fire exactly once each, in registration order.

use crate::types::{CancelReason, Errors, Outcome};
use core::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll, Waker};
use thiserror::Error;

/// Error returned by the strict resolution forms on a duplicate write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The handle already reached a terminal outcome.
    #[error("handle already resolved")]
    AlreadyResolved,
}

type Continuation<T, E> = Box<dyn FnOnce(&Outcome<T, E>) + Send>;

struct Waiters<T, E> {
    /// True once the resolving side has drained the lists below.
    notified: bool,
    wakers: Vec<Waker>,
    continuations: Vec<Continuation<T, E>>,
}

struct Shared<T, E> {
    outcome: OnceLock<Outcome<T, E>>,
    waiters: Mutex<Waiters<T, E>>,
}

impl<T, E> Shared<T, E> {
    fn pending() -> Self {
        Self {
            outcome: OnceLock::new(),
            waiters: Mutex::new(Waiters {
                notified: false,
                wakers: Vec::new(),
                continuations: Vec::new(),
            }),
        }
    }

    /// Drains and fires waiters after `outcome` has been set.
    fn notify(&self) {
        let (wakers, continuations) = {
            let mut waiters = self.waiters.lock().expect("handle lock poisoned");
            waiters.notified = true;
            (
                mem::take(&mut waiters.wakers),
                mem::take(&mut waiters.continuations),
            )
        };
        if let Some(outcome) = self.outcome.get() {
            for continuation in continuations {
                continuation(outcome);
            }
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

/// Creates a pending handle together with its paired resolver.
///
/// # Example
///
/// ```
/// use asyncext::handle;
///
/// let (resolver, handle) = handle::pair::<i32, &str>();
/// assert!(!handle.is_terminal());
/// assert!(resolver.try_complete(42));
/// assert!(handle.is_terminal());
/// ```
#[must_use]
pub fn pair<T, E>() -> (Resolver<T, E>, Handle<T, E>) {
    let shared = Arc::new(Shared::pending());
    (
        Resolver {
            shared: Arc::clone(&shared),
        },
        Handle { shared },
    )
}

/// Adapts callback-style completion into a handle.
///
/// `start` receives the write capability and is expected to hand it to
/// whatever context eventually completes the operation. The returned handle
/// observes that resolution like any other.
///
/// # Example
///
/// ```
/// use asyncext::handle;
///
/// let handle = handle::bridge::<i32, &str>(|resolver| {
///     // a callback-based API would stash the resolver and call it later
///     resolver.try_complete(7);
/// });
/// assert!(handle.is_terminal());
/// ```
pub fn bridge<T, E>(start: impl FnOnce(Resolver<T, E>)) -> Handle<T, E> {
    let (resolver, handle) = pair();
    start(resolver);
    handle
}

/// The write-side capability paired one-to-one with a [`Handle`].
///
/// Not cloneable: there is exactly one writer. Dropping an unresolved
/// resolver cancels the handle with [`CancelReason::resolver_dropped`] so
/// observers never hang.
pub struct Resolver<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Resolver<T, E> {
    /// Resolves the handle with `outcome`.
    ///
    /// Every other resolution form funnels through here (or its `try`
    /// sibling), so the classification of terminal states is implemented
    /// once, independent of whether a value is carried.
    pub fn resolve(&self, outcome: Outcome<T, E>) -> Result<(), ResolveError> {
        if self.try_resolve(outcome) {
            Ok(())
        } else {
            Err(ResolveError::AlreadyResolved)
        }
    }

    /// Resolves the handle with `outcome` if it is still pending.
    ///
    /// Returns `true` if this call resolved the handle; `false` if it was
    /// already resolved (the first write wins and the duplicate outcome is
    /// discarded).
    pub fn try_resolve(&self, outcome: Outcome<T, E>) -> bool {
        let variant = variant_name(&outcome);
        if self.shared.outcome.set(outcome).is_err() {
            tracing::trace!(variant, "duplicate resolution ignored");
            return false;
        }
        tracing::trace!(variant, "handle resolved");
        self.shared.notify();
        true
    }

    /// Resolves the handle as `Completed(value)`.
    pub fn complete(&self, value: T) -> Result<(), ResolveError> {
        self.resolve(Outcome::Completed(value))
    }

    /// Resolves the handle as `Canceled(reason)`.
    pub fn cancel(&self, reason: CancelReason) -> Result<(), ResolveError> {
        self.resolve(Outcome::Canceled(reason))
    }

    /// Resolves the handle as `Failed` with a single error.
    pub fn fail(&self, error: E) -> Result<(), ResolveError> {
        self.resolve(Outcome::failed(error))
    }

    /// Resolves the handle as `Failed` with an error collection.
    pub fn fail_all(&self, errors: Errors<E>) -> Result<(), ResolveError> {
        self.resolve(Outcome::Failed(errors))
    }

    /// Idempotent form of [`Resolver::complete`].
    pub fn try_complete(&self, value: T) -> bool {
        self.try_resolve(Outcome::Completed(value))
    }

    /// Idempotent form of [`Resolver::cancel`].
    pub fn try_cancel(&self, reason: CancelReason) -> bool {
        self.try_resolve(Outcome::Canceled(reason))
    }

    /// Idempotent form of [`Resolver::fail`].
    pub fn try_fail(&self, error: E) -> bool {
        self.try_resolve(Outcome::failed(error))
    }

    /// Idempotent form of [`Resolver::fail_all`].
    pub fn try_fail_all(&self, errors: Errors<E>) -> bool {
        self.try_resolve(Outcome::Failed(errors))
    }

    /// Returns true if the paired handle has reached a terminal outcome.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.shared.outcome.get().is_some()
    }
}

impl<T, E> Drop for Resolver<T, E> {
    fn drop(&mut self) {
        if self.try_resolve(Outcome::Canceled(CancelReason::resolver_dropped())) {
            tracing::debug!("resolver dropped before resolution; handle canceled");
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A cloneable observer of a write-once asynchronous computation.
///
/// Implements `Future<Output = Outcome<T, E>>`; any number of clones can be
/// awaited independently.
pub struct Handle<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Handle<T, E> {
    /// Creates an already-resolved handle from a terminal outcome.
    #[must_use]
    pub fn from_outcome(outcome: Outcome<T, E>) -> Self {
        let shared = Shared::pending();
        // Fresh cell; the set cannot fail.
        let _ = shared.outcome.set(outcome);
        shared.waiters.lock().expect("handle lock poisoned").notified = true;
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Creates an already-resolved `Completed` handle.
    ///
    /// # Example
    ///
    /// ```
    /// use asyncext::{test_utils::block_on, Handle, Outcome};
    ///
    /// let handle = Handle::<i32, &str>::completed(42);
    /// assert_eq!(block_on(handle), Outcome::Completed(42));
    /// ```
    #[must_use]
    pub fn completed(value: T) -> Self {
        Self::from_outcome(Outcome::Completed(value))
    }

    /// Creates an already-resolved `Canceled` handle.
    #[must_use]
    pub fn canceled(reason: CancelReason) -> Self {
        Self::from_outcome(Outcome::Canceled(reason))
    }

    /// Creates an already-resolved `Failed` handle with a single error.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::from_outcome(Outcome::failed(error))
    }

    /// Creates an already-resolved `Failed` handle with an error collection.
    #[must_use]
    pub fn failed_all(errors: Errors<E>) -> Self {
        Self::from_outcome(Outcome::Failed(errors))
    }

    /// Returns true if the handle has reached a terminal outcome.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    /// Returns a copy of the terminal outcome without blocking, if resolved.
    #[must_use]
    pub fn peek(&self) -> Option<Outcome<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        self.shared.outcome.get().cloned()
    }

    /// Attaches a continuation that fires exactly once with the terminal
    /// outcome.
    ///
    /// Continuations registered while the handle is pending run when the
    /// resolver resolves it, in registration order, on the resolving
    /// thread. Registering on an already-resolved handle runs the
    /// continuation before `on_terminal` returns.
    pub fn on_terminal<F>(&self, f: F)
    where
        F: FnOnce(&Outcome<T, E>) + Send + 'static,
    {
        let late = {
            let mut waiters = self.shared.waiters.lock().expect("handle lock poisoned");
            if waiters.notified {
                Some(f)
            } else {
                waiters.continuations.push(Box::new(f));
                None
            }
        };
        if let Some(f) = late {
            // `notified` implies the outcome was published first.
            if let Some(outcome) = self.shared.outcome.get() {
                f(outcome);
            }
        }
    }
}

impl<T, E> Clone for Handle<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Handle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("terminal", &self.is_terminal())
            .finish()
    }
}

impl<T: Clone, E: Clone> Future for Handle<T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.shared.outcome.get() {
            return Poll::Ready(outcome.clone());
        }

        let mut waiters = self.shared.waiters.lock().expect("handle lock poisoned");
        // Re-check under the lock: the resolver may have won the race above.
        if let Some(outcome) = self.shared.outcome.get() {
            return Poll::Ready(outcome.clone());
        }
        if !waiters.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            waiters.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

fn variant_name<T, E>(outcome: &Outcome<T, E>) -> &'static str {
    match outcome {
        Outcome::Completed(_) => "completed",
        Outcome::Canceled(_) => "canceled",
        Outcome::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{block_on, init_test_logging, TestError};
    use crate::types::CancelKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn complete_then_await() {
        init_test("complete_then_await");
        let (resolver, handle) = pair::<i32, TestError>();
        resolver.complete(42).expect("first resolution");

        let outcome = block_on(handle);
        crate::assert_outcome_completed!(outcome, 42);
        crate::test_complete!("complete_then_await");
    }

    #[test]
    fn await_then_complete_from_another_thread() {
        init_test("await_then_complete_from_another_thread");
        let (resolver, handle) = pair::<i32, TestError>();

        let resolving = std::thread::spawn(move || {
            resolver.complete(7).expect("first resolution");
        });

        let outcome = block_on(handle);
        crate::assert_outcome_completed!(outcome, 7);
        resolving.join().expect("resolver thread");
        crate::test_complete!("await_then_complete_from_another_thread");
    }

    #[test]
    fn strict_double_resolution_is_an_error() {
        init_test("strict_double_resolution_is_an_error");
        let (resolver, handle) = pair::<i32, TestError>();
        resolver.complete(1).expect("first resolution");

        let err = resolver.complete(2);
        crate::assert_with_log!(
            err == Err(ResolveError::AlreadyResolved),
            "second strict write",
            Err::<(), _>(ResolveError::AlreadyResolved),
            err
        );
        crate::assert_outcome_completed!(block_on(handle), 1);
        crate::test_complete!("strict_double_resolution_is_an_error");
    }

    #[test]
    fn try_resolution_first_write_wins() {
        init_test("try_resolution_first_write_wins");
        let (resolver, handle) = pair::<i32, TestError>();

        assert!(resolver.try_complete(1));
        assert!(!resolver.try_fail(TestError("late")));
        assert!(!resolver.try_cancel(CancelReason::timeout()));

        crate::assert_outcome_completed!(block_on(handle), 1);
        crate::test_complete!("try_resolution_first_write_wins");
    }

    #[test]
    fn fail_all_carries_collection_unchanged() {
        init_test("fail_all_carries_collection_unchanged");
        let (resolver, handle) = pair::<i32, TestError>();
        let errors: Errors<TestError> = [TestError("first"), TestError("second")]
            .into_iter()
            .collect();
        resolver.fail_all(errors.clone()).expect("first resolution");

        match block_on(handle) {
            Outcome::Failed(observed) => assert_eq!(observed, errors),
            other => unreachable!("expected Outcome::Failed, got {other:?}"),
        }
        crate::test_complete!("fail_all_carries_collection_unchanged");
    }

    #[test]
    fn dropping_resolver_cancels_handle() {
        init_test("dropping_resolver_cancels_handle");
        let (resolver, handle) = pair::<i32, TestError>();
        drop(resolver);

        match block_on(handle) {
            Outcome::Canceled(reason) => assert_eq!(reason.kind(), CancelKind::Shutdown),
            other => unreachable!("expected Outcome::Canceled, got {other:?}"),
        }
        crate::test_complete!("dropping_resolver_cancels_handle");
    }

    #[test]
    fn clones_observe_the_same_outcome() {
        init_test("clones_observe_the_same_outcome");
        let (resolver, handle) = pair::<i32, TestError>();
        let other = handle.clone();
        resolver.complete(5).expect("first resolution");

        crate::assert_outcome_completed!(block_on(handle), 5);
        crate::assert_outcome_completed!(block_on(other), 5);
        crate::test_complete!("clones_observe_the_same_outcome");
    }

    #[test]
    fn on_terminal_fires_once_when_pending() {
        init_test("on_terminal_fires_once_when_pending");
        static FIRED: AtomicUsize = AtomicUsize::new(0);
        FIRED.store(0, Ordering::SeqCst);

        let (resolver, handle) = pair::<i32, TestError>();
        handle.on_terminal(|outcome| {
            assert!(outcome.is_completed());
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);

        resolver.complete(3).expect("first resolution");
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
        crate::test_complete!("on_terminal_fires_once_when_pending");
    }

    #[test]
    fn on_terminal_runs_for_already_resolved() {
        init_test("on_terminal_runs_for_already_resolved");
        let handle = Handle::<i32, TestError>::completed(9);
        let fired = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&fired);
        handle.on_terminal(move |outcome| {
            assert!(outcome.is_completed());
            observed.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        crate::test_complete!("on_terminal_runs_for_already_resolved");
    }

    #[test]
    fn constructors_are_terminal() {
        init_test("constructors_are_terminal");
        assert!(Handle::<i32, TestError>::completed(1).is_terminal());
        assert!(Handle::<i32, TestError>::failed(TestError("boom")).is_terminal());
        assert!(Handle::<i32, TestError>::canceled(CancelReason::timeout()).is_terminal());
        crate::test_complete!("constructors_are_terminal");
    }

    #[test]
    fn peek_does_not_consume() {
        init_test("peek_does_not_consume");
        let handle = Handle::<i32, TestError>::completed(11);
        assert_eq!(handle.peek(), Some(Outcome::Completed(11)));
        assert_eq!(handle.peek(), Some(Outcome::Completed(11)));
        crate::test_complete!("peek_does_not_consume");
    }

    #[test]
    fn bridge_hands_resolver_to_callback() {
        init_test("bridge_hands_resolver_to_callback");
        let handle = bridge::<i32, TestError>(|resolver| {
            std::thread::spawn(move || {
                resolver.complete(21).expect("first resolution");
            });
        });
        crate::assert_outcome_completed!(block_on(handle), 21);
        crate::test_complete!("bridge_hands_resolver_to_callback");
    }
}
