use std::io;
use std::os::fd::RawFd;

use tracing::{Span, debug, error, info};

use crate::buffer::chain::Segment;
use crate::classify::{ReadOutcome, Step, classify};
use crate::config::Config;
use crate::error::ReadError;
use crate::iovec::IoVecs;
use crate::metrics;
use crate::readiness::{Backend, ReadEvent};
use crate::sys;
use crate::vectored::{PlatformReadv, VectoredRead};

/// Read side of one streaming connection.
///
/// Holds the descriptor (not owned; the caller closes it), the span used as
/// the connection's log sink, the readiness record the event loop updates,
/// and the backend and read primitive fixed at setup.
pub struct Connection<R = PlatformReadv> {
    fd: RawFd,
    log: Span,
    backend: Backend,
    max_iovecs: usize,
    reader: R,
    /// Read readiness, updated by the event loop and by [`readv_chain`](Self::readv_chain).
    pub read: ReadEvent,
}

impl Connection<PlatformReadv> {
    /// A connection using the default config and this build's read primitive.
    pub fn new(fd: RawFd) -> Self {
        Self::with_config(fd, &Config::default())
    }

    pub fn with_config(fd: RawFd, config: &Config) -> Self {
        Self::with_reader(fd, config, PlatformReadv::default())
    }
}

impl<R: VectoredRead> Connection<R> {
    /// A connection reading through a specific [`VectoredRead`].
    pub fn with_reader(fd: RawFd, config: &Config, reader: R) -> Self {
        Connection {
            fd,
            log: tracing::info_span!("conn", fd),
            backend: config.backend,
            max_iovecs: config.max_iovecs,
            reader,
            read: ReadEvent::new(),
        }
    }

    /// Replace the log span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.log = span;
        self
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn span(&self) -> &Span {
        &self.log
    }

    /// Fill `chain` with as much as one read delivers.
    ///
    /// `limit` caps the bytes requested (0 = whole chain). On
    /// `Bytes(n)` the first `n` writable bytes of the chain, in order, hold
    /// the data; segment cursors are left for the caller to advance. The
    /// call never blocks and retries only on `EINTR`.
    pub fn readv_chain(&mut self, chain: &mut [Segment<'_>], limit: usize) -> ReadOutcome {
        let backend = self.backend;

        if let Some(outcome) = backend.before_read(&mut self.read, &self.log) {
            metrics::READV_SKIPPED.increment();
            return outcome;
        }

        let mut iovecs = IoVecs::coalesce_bounded(chain, limit, self.max_iovecs);

        debug!(
            parent: &self.log,
            iovs = iovecs.len(),
            last = iovecs.last_len(),
            "readv"
        );

        if iovecs.is_empty() {
            debug!(parent: &self.log, "readv: no writable space in chain");
            return ReadOutcome::Error(ReadError::new(ReadError::COALESCE_OP, libc::EINVAL));
        }

        let size = iovecs.size();

        loop {
            metrics::READV_CALLS.increment();
            let result = self.reader.read_vectored(self.fd, &mut iovecs, &self.log);

            match classify(result) {
                Step::Transferred(n) => {
                    metrics::BYTES_RECEIVED.add(n as u64);
                    let fd = self.fd;
                    let booked =
                        backend.after_read(&mut self.read, n, size, || sys::nread(fd), &self.log);
                    if let Err(err) = booked {
                        return self.fail("ioctl(FIONREAD)", &err);
                    }
                    return ReadOutcome::Bytes(n);
                }
                Step::Eof => {
                    backend.on_eof(&mut self.read);
                    metrics::READV_EOF.increment();
                    return ReadOutcome::Eof;
                }
                Step::Interrupted => {
                    debug!(parent: &self.log, "readv() interrupted, retrying");
                    metrics::READV_INTERRUPTED.increment();
                }
                Step::WouldBlock => {
                    debug!(parent: &self.log, "readv() not ready");
                    self.read.ready = false;
                    metrics::READV_WOULD_BLOCK.increment();
                    return ReadOutcome::WouldBlock;
                }
                Step::Fatal(err) => return self.fail("readv()", &err),
            }
        }
    }

    fn fail(&mut self, op: &'static str, err: &io::Error) -> ReadOutcome {
        let errno = err.raw_os_error().unwrap_or(libc::EIO);
        if is_peer_error(errno) {
            info!(parent: &self.log, op, error = %err, "connection read failed");
        } else {
            error!(parent: &self.log, op, error = %err, "connection read failed");
        }
        self.read.ready = false;
        self.read.error = true;
        metrics::READV_ERRORS.increment();
        ReadOutcome::Error(ReadError::from_io(op, err))
    }
}

/// Errors caused by the peer or the network rather than by this process.
fn is_peer_error(errno: i32) -> bool {
    matches!(
        errno,
        libc::ECONNRESET
            | libc::ECONNREFUSED
            | libc::ECONNABORTED
            | libc::ENOTCONN
            | libc::ETIMEDOUT
            | libc::EPIPE
            | libc::ENETDOWN
            | libc::ENETUNREACH
            | libc::EHOSTDOWN
            | libc::EHOSTUNREACH
    )
}
