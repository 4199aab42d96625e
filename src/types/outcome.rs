//! Three-valued outcome type for asynchronous operations.
//!
//! The outcome type represents the terminal state of an asynchronous
//! operation:
//!
//! - `Completed(T)`: finished successfully with a value
//! - `Canceled(CancelReason)`: aborted before producing a result
//! - `Failed(Errors<E>)`: terminated with one or more errors
//!
//! All variants are terminal and absorbing: a handle or combinator that has
//! reached one never leaves it. The combinator layer inspects the
//! discriminant explicitly rather than funneling everything through error
//! propagation, because cancellation and failure must be told apart.

use super::cancel::CancelReason;
use super::errors::Errors;
use core::fmt;

/// The terminal outcome of an asynchronous operation.
///
/// The valueless case is `Outcome<(), E>`; generics subsume it, so there is
/// a single implementation of every operation over outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The operation finished successfully.
    Completed(T),
    /// The operation was canceled before producing a result.
    Canceled(CancelReason),
    /// The operation terminated with one or more errors.
    Failed(Errors<E>),
}

impl<T, E> Outcome<T, E> {
    /// Creates a failed outcome from a single error.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::Failed(Errors::one(error))
    }

    /// Returns true if this outcome is `Completed`.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if this outcome is `Canceled`.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    /// Returns true if this outcome is `Failed`.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Maps the success value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Completed(v) => Outcome::Completed(f(v)),
            Self::Canceled(r) => Outcome::Canceled(r),
            Self::Failed(errs) => Outcome::Failed(errs),
        }
    }

    /// Maps every error value using the provided function.
    pub fn map_err<F2, G: FnMut(E) -> F2>(self, g: G) -> Outcome<T, F2> {
        match self {
            Self::Completed(v) => Outcome::Completed(v),
            Self::Canceled(r) => Outcome::Canceled(r),
            Self::Failed(errs) => Outcome::Failed(errs.into_iter().map(g).collect()),
        }
    }

    /// Converts this outcome to a standard `Result`, with cancellation and
    /// failure as errors.
    pub fn into_result(self) -> Result<T, OutcomeError<E>> {
        match self {
            Self::Completed(v) => Ok(v),
            Self::Canceled(r) => Err(OutcomeError::Canceled(r)),
            Self::Failed(errs) => Err(OutcomeError::Failed(errs)),
        }
    }

    /// Returns the success value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is not `Completed`.
    #[track_caller]
    pub fn unwrap(self) -> T
    where
        E: fmt::Debug,
    {
        match self {
            Self::Completed(v) => v,
            Self::Canceled(r) => {
                panic!("called `Outcome::unwrap()` on a `Canceled` value: {r}")
            }
            Self::Failed(errs) => {
                panic!("called `Outcome::unwrap()` on a `Failed` value: {errs:?}")
            }
        }
    }

    /// Returns the success value or a default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Completed(v) => v,
            _ => default,
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Completed(v),
            Err(e) => Self::failed(e),
        }
    }
}

/// Error type for converting an [`Outcome`] to a `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError<E> {
    /// The operation was canceled.
    Canceled(CancelReason),
    /// The operation failed with one or more errors.
    Failed(Errors<E>),
}

impl<E: fmt::Display> fmt::Display for OutcomeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled(r) => write!(f, "canceled: {r}"),
            Self::Failed(errs) => write!(f, "{errs}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for OutcomeError<E> {}
