//! recvchain: vectored receive path for non-blocking stream sockets.
//!
//! Fills a chain of caller-owned, partially written buffers from one
//! connection with as few read syscalls as possible:
//!
//! - neighbouring buffers are coalesced into a bounded `iovec` array,
//! - a per-connection readiness record, maintained for whichever
//!   event-notification backend drives the loop, lets reads that cannot
//!   succeed be skipped without a syscall,
//! - targets without `readv(2)` get an emulated scatter read with identical
//!   results.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::os::fd::AsRawFd;
//!
//! use recvchain::{Connection, ReadOutcome, Segment, advance_chain};
//!
//! fn main() -> Result<(), recvchain::Error> {
//!     let (rx, _tx) = recvchain::sys::stream_pair()?;
//!     let mut conn = Connection::new(rx.as_raw_fd());
//!     conn.read.notify(-1);
//!
//!     let mut storage = [0u8; 4096];
//!     let (head, tail) = storage.split_at_mut(1024);
//!     let mut chain = [Segment::new(head), Segment::new(tail)];
//!
//!     while conn.read.should_read() {
//!         match conn.readv_chain(&mut chain, 0) {
//!             ReadOutcome::Bytes(n) => {
//!                 advance_chain(&mut chain, n);
//!             }
//!             ReadOutcome::WouldBlock | ReadOutcome::Eof => break,
//!             ReadOutcome::Error(err) => return Err(std::io::Error::from(err).into()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Platform
//!
//! Unix only. The readiness record is fed by an event loop outside this
//! crate; see [`readiness`] for the backends it understands.

// ── Internal modules ────────────────────────────────────────────────────
pub(crate) mod classify;
pub(crate) mod metrics;

// ── Public modules ──────────────────────────────────────────────────────
pub mod buffer;
pub mod config;
pub mod connection;
pub mod error;
pub mod iovec;
pub mod readiness;
pub mod sys;
pub mod vectored;

// ── Re-exports: Pipeline ────────────────────────────────────────────────

/// Read side of a connection; runs the receive pipeline.
pub use connection::Connection;
/// Result of one pipeline invocation.
pub use classify::ReadOutcome;

// ── Re-exports: Buffers ─────────────────────────────────────────────────

/// Caller-owned writable buffer with a fill cursor.
pub use buffer::chain::Segment;
/// Advance cursors across a chain after a read.
pub use buffer::chain::advance_chain;
/// Total writable capacity of a chain.
pub use buffer::chain::chain_capacity;
/// Coalesced iovec array over a chain.
pub use iovec::IoVecs;
/// Maximum iovecs per vectored read.
pub use iovec::MAX_IOVECS;

// ── Re-exports: Readiness ───────────────────────────────────────────────

/// Event-notification backend model.
pub use readiness::Backend;
/// Per-connection read readiness record.
pub use readiness::ReadEvent;

// ── Re-exports: Read primitives ─────────────────────────────────────────

/// Emulated scatter read (single `read(2)` + copy).
pub use vectored::EmulatedReadv;
/// Native `readv(2)`.
pub use vectored::NativeReadv;
/// Read primitive selected for this build.
pub use vectored::PlatformReadv;
/// Trait implemented by vectored read primitives.
pub use vectored::VectoredRead;

// ── Re-exports: Shared types ────────────────────────────────────────────

/// Receive pipeline configuration.
pub use config::Config;
/// Builder for [`Config`] with `build()` validation.
pub use config::ConfigBuilder;
/// Setup errors.
pub use error::Error;
/// Connection-scoped read failure.
pub use error::ReadError;
