//! Per-connection read readiness across event-notification backends.
//!
//! The event loop (outside this crate) fills in a [`ReadEvent`] when the
//! kernel reports the descriptor readable. The receive pipeline consults it
//! before issuing a read, possibly answering without a syscall, and updates
//! it afterwards so the loop knows whether to read again or wait for the
//! next notification.
//!
//! How much a backend tells us differs:
//!
//! - kqueue-style backends report the exact byte count and a pending EOF
//!   (with an optional error code): [`Backend::PreciseCount`].
//! - epoll with peer-hangup reporting only says "readable" plus a pending
//!   EOF flag: [`Backend::EofFlag`].
//! - Backends with no count at all can ask the socket with `FIONREAD` after
//!   a read that filled every descriptor: [`Backend::QueryAfterRead`].
//! - Greedy backends keep reporting readiness, so a short read says nothing
//!   about the receive queue: [`Backend::BestEffort`].
//! - Plain level-triggered `poll`/`select`: [`Backend::Plain`].

use std::fmt;
use std::io;

use tracing::{Span, debug, info};

use crate::classify::ReadOutcome;
use crate::error::ReadError;

/// Event-notification model governing a connection's readiness record.
///
/// Chosen once per connection and never re-checked per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Exact available byte count plus pending EOF (kqueue `EVFILT_READ`).
    PreciseCount,
    /// Readable flag plus pending EOF, no byte count (epoll + `EPOLLRDHUP`).
    EofFlag,
    /// No count from the backend; refreshed with `FIONREAD` after full reads.
    QueryAfterRead,
    /// Readiness is not cleared by short reads.
    BestEffort,
    /// Level-triggered; a short read means the queue is drained.
    Plain,
}

impl Backend {
    /// The backend this platform's event loop normally runs on.
    pub fn detect() -> Self {
        if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly",
        )) {
            Backend::PreciseCount
        } else if cfg!(any(target_os = "linux", target_os = "android")) {
            Backend::EofFlag
        } else {
            Backend::Plain
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::PreciseCount => "precise-count",
            Backend::EofFlag => "eof-flag",
            Backend::QueryAfterRead => "query-after-read",
            Backend::BestEffort => "best-effort",
            Backend::Plain => "plain",
        }
    }

    /// Decide whether a read is worth issuing.
    ///
    /// Returns `Some(outcome)` when the cached state already answers the
    /// question, in which case no syscall must be made.
    pub(crate) fn before_read(self, ev: &mut ReadEvent, log: &Span) -> Option<ReadOutcome> {
        match self {
            Backend::PreciseCount => {
                debug!(
                    parent: log,
                    eof = ev.pending_eof,
                    avail = ev.available,
                    err = ev.backend_errno,
                    "readv: backend state"
                );
                if ev.available != 0 {
                    return None;
                }
                if !ev.pending_eof {
                    return Some(ReadOutcome::WouldBlock);
                }

                ev.ready = false;
                ev.eof = true;
                info!(
                    parent: log,
                    errno = ev.backend_errno,
                    "event backend reported a closed connection"
                );
                if ev.backend_errno != 0 {
                    ev.error = true;
                    return Some(ReadOutcome::Error(ReadError::new(
                        "pending eof",
                        ev.backend_errno,
                    )));
                }
                Some(ReadOutcome::Eof)
            }
            Backend::EofFlag => {
                debug!(
                    parent: log,
                    eof = ev.pending_eof,
                    avail = ev.available,
                    "readv: backend state"
                );
                if ev.available == 0 && !ev.pending_eof {
                    return Some(ReadOutcome::WouldBlock);
                }
                None
            }
            Backend::QueryAfterRead | Backend::BestEffort | Backend::Plain => None,
        }
    }

    /// Bookkeeping after a read returned `n > 0` of the `size` bytes asked for.
    ///
    /// `query` reports the bytes still queued on the socket; only the
    /// query-after-read backend calls it, and its error is returned as-is.
    pub(crate) fn after_read<Q>(
        self,
        ev: &mut ReadEvent,
        n: usize,
        size: usize,
        query: Q,
        log: &Span,
    ) -> io::Result<()>
    where
        Q: FnOnce() -> io::Result<i64>,
    {
        debug_assert!(n > 0 && n <= size, "read {n} of {size}");
        let n_signed = n as i64;

        match self {
            Backend::PreciseCount => {
                // May go negative: more bytes can arrive between the
                // notification and the read.
                ev.available -= n_signed;
                if ev.available <= 0 {
                    if !ev.pending_eof {
                        ev.ready = false;
                    }
                    ev.available = 0;
                }
            }
            Backend::EofFlag => {
                if n < size {
                    if !ev.pending_eof {
                        ev.ready = false;
                    }
                    ev.available = 0;
                }
            }
            Backend::QueryAfterRead => {
                if ev.available >= 0 {
                    ev.available -= n_signed;
                    // Overshoot means more arrived after the last count, so
                    // readiness can be dropped even when edge-triggered.
                    if ev.available < 0 {
                        ev.available = 0;
                        ev.ready = false;
                    }
                    debug!(parent: log, avail = ev.available, "readv: avail");
                } else if n == size {
                    ev.available = query()?;
                    if ev.available == 0 {
                        ev.ready = false;
                    }
                    debug!(parent: log, avail = ev.available, "readv: avail");
                }
                if n < size {
                    ev.ready = false;
                }
            }
            Backend::BestEffort => {}
            Backend::Plain => {
                if n < size {
                    ev.ready = false;
                }
            }
        }
        Ok(())
    }

    /// Bookkeeping after a read returned zero bytes.
    pub(crate) fn on_eof(self, ev: &mut ReadEvent) {
        ev.ready = false;
        ev.eof = true;
        // A zero-byte read can follow a notification that still counted
        // bytes; drop the stale count.
        if self == Backend::PreciseCount {
            ev.available = 0;
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::detect()
    }
}

/// Read-side readiness record for one connection.
///
/// Written by the event loop when a notification arrives and by the receive
/// pipeline after each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadEvent {
    /// The descriptor may have data; reading is worthwhile.
    pub ready: bool,
    /// The peer closed its side and everything has been read.
    pub eof: bool,
    /// The connection failed; no further reads should be attempted.
    pub error: bool,
    /// The backend reported the peer's close, but data may still be queued.
    pub pending_eof: bool,
    /// Byte estimate. Meaning depends on the backend; negative is "unknown".
    pub available: i64,
    /// Error code the backend attached to a pending EOF, 0 if none.
    pub backend_errno: i32,
}

impl ReadEvent {
    /// A record with no notification seen yet.
    pub const fn new() -> Self {
        ReadEvent {
            ready: false,
            eof: false,
            error: false,
            pending_eof: false,
            available: 0,
            backend_errno: 0,
        }
    }

    /// Record a readable notification with `available` bytes
    /// (negative when the backend gives no count).
    pub fn notify(&mut self, available: i64) {
        self.ready = true;
        self.available = available;
    }

    /// Record that the backend saw the peer's close. `errno` is the error
    /// code reported alongside it, 0 for a clean close.
    pub fn notify_eof(&mut self, errno: i32) {
        self.ready = true;
        self.pending_eof = true;
        self.backend_errno = errno;
    }

    /// Whether the caller should invoke the pipeline again without waiting.
    pub fn should_read(&self) -> bool {
        self.ready && !self.eof && !self.error
    }
}

impl Default for ReadEvent {
    fn default() -> Self {
        Self::new()
    }
}
