//! Minimal async I/O traits and the keep-alive stream wrapper.
//!
//! The traits mirror the poll-based shape of `std::io` lifted into futures:
//! [`AsyncRead`], [`AsyncWrite`], and [`AsyncSeek`], with in-memory
//! implementations (`Vec<u8>`, `std::io::Cursor`) so adapters are testable
//! without a reactor.
//!
//! [`KeepAlive`] is the one adapter provided: it exposes the wrapped
//! stream's surface unchanged except that shutdown flushes buffered data
//! and stops there — the underlying resource's lifetime is managed
//! elsewhere.

mod keep_alive;
mod read;
mod seek;
mod write;

pub use keep_alive::KeepAlive;
pub use read::AsyncRead;
pub use seek::AsyncSeek;
pub use write::AsyncWrite;

pub use std::io::SeekFrom;
