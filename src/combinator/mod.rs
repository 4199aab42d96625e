//! Combinators over outcome-producing operations.
//!
//! - [`finally`]: attach a cleanup action that runs exactly once on every
//!   terminal path, with cleanup failure overriding the original outcome

pub mod finally;

pub use finally::{finally, Finally, HandleExt};
