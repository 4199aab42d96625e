//! Asyncext: small extension utilities over async tasks and byte streams.
//!
//! # Overview
//!
//! This crate provides a handful of building blocks that sit on top of a
//! plain futures-style task abstraction:
//!
//! - A three-valued [`Outcome`] type describing how an asynchronous
//!   operation terminated: completed with a value, canceled, or failed with
//!   one or more errors.
//! - A write-once [`Handle`]/[`Resolver`] pair: the handle is a cloneable
//!   observer that can be awaited by any number of consumers, the resolver
//!   is the single write capability that settles it exactly once.
//! - The [`finally`] combinator: attach a cleanup action to an operation so
//!   that the cleanup runs exactly once on every terminal path, and a
//!   cleanup failure overrides whatever the operation itself produced.
//! - A [`KeepAlive`] stream wrapper that flushes on shutdown but never
//!   closes the underlying stream, for resources whose lifetime is managed
//!   elsewhere.
//!
//! # Core Guarantees
//!
//! - **Write-once resolution**: a handle transitions from pending to exactly
//!   one terminal outcome, irreversibly; idempotent `try_*` resolution never
//!   raises on a duplicate write
//! - **Cleanup always runs**: `finally` invokes its cleanup action on
//!   success, cancellation, and failure alike, exactly once
//! - **Cleanup failure wins**: an error from the cleanup action becomes the
//!   final outcome, superseding even a successful or canceled operation
//! - **Faithful propagation**: when cleanup succeeds, the original outcome
//!   is reproduced verbatim (same value, same cancel reason, same error
//!   collection, never wrapped)
//!
//! # Module Structure
//!
//! - [`types`]: Core types (`Outcome`, `Errors`, cancellation reasons)
//! - [`handle`]: Write-once handle/resolver pair and completed-handle
//!   constructors
//! - [`combinator`]: The `finally` combinator
//! - [`io`]: Minimal async I/O traits and the keep-alive wrapper
//! - [`test_utils`]: Logging and assertion helpers for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod combinator;
pub mod handle;
pub mod io;
pub mod test_utils;
pub mod types;

// Re-exports for convenient access to core types
pub use combinator::{finally, Finally, HandleExt};
pub use handle::{bridge, Handle, ResolveError, Resolver};
pub use io::{AsyncRead, AsyncSeek, AsyncWrite, KeepAlive};
pub use types::{CancelKind, CancelReason, Errors, Outcome, OutcomeError};
