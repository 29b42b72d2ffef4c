//! Vectored read primitives.
//!
//! [`NativeReadv`] issues one `readv(2)`. [`EmulatedReadv`] targets
//! platforms without a scatter-read syscall: it reads into one contiguous
//! transfer buffer with `read(2)` and copies the bytes out to each iovec in
//! order. Both return the same byte count and leave the same bytes in the
//! same places. [`PlatformReadv`] picks one at compile time via the
//! `emulated-readv` feature.

use std::io;
use std::os::fd::RawFd;

use bytes::BytesMut;
use tracing::{Span, debug, error};

use crate::iovec::IoVecs;
use crate::sys;

/// A single vectored read attempt on a descriptor.
///
/// Implementations perform exactly one underlying transfer per call and
/// report the raw outcome; retry policy belongs to the caller.
pub trait VectoredRead {
    /// Read into the regions described by `iovecs`.
    ///
    /// `log` is the connection's span; failures are recorded against it.
    fn read_vectored(&mut self, fd: RawFd, iovecs: &mut IoVecs<'_, '_>, log: &Span) -> io::Result<usize>;
}

/// `readv(2)` on the descriptor array as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeReadv;

impl VectoredRead for NativeReadv {
    #[inline]
    fn read_vectored(&mut self, fd: RawFd, iovecs: &mut IoVecs<'_, '_>, _log: &Span) -> io::Result<usize> {
        // Safety: IoVecs only holds writable ranges of segments it borrows
        // mutably for its whole lifetime.
        unsafe { sys::readv(fd, iovecs.as_slice()) }
    }
}

/// `read(2)` into a transfer buffer, then scatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmulatedReadv;

impl VectoredRead for EmulatedReadv {
    fn read_vectored(&mut self, fd: RawFd, iovecs: &mut IoVecs<'_, '_>, log: &Span) -> io::Result<usize> {
        let total = match total_len(iovecs.as_slice()) {
            Ok(0) => return Ok(0),
            Ok(total) => total,
            Err(err) => {
                error!(parent: log, iovs = iovecs.len(), "emulated readv: invalid descriptor array");
                return Err(err);
            }
        };

        // Dropped on every return path below.
        let mut transfer = BytesMut::zeroed(total);

        let n = match sys::read(fd, &mut transfer) {
            Ok(n) => n,
            Err(err) => {
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                        debug!(parent: log, error = %err, "emulated readv: read() not ready");
                    }
                    _ => {
                        error!(parent: log, error = %err, "emulated readv: read() failed");
                    }
                }
                return Err(err);
            }
        };

        let scattered = iovecs.scatter(&transfer[..n]);
        debug_assert_eq!(scattered, n, "scattered {scattered} of {n} bytes");
        Ok(n)
    }
}

/// Total length of a descriptor array, as `readv(2)` validates it: `EINVAL`
/// for an empty array or a sum that overflows `isize`.
fn total_len(iovecs: &[libc::iovec]) -> io::Result<usize> {
    if iovecs.is_empty() {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }
    iovecs
        .iter()
        .try_fold(0usize, |total, iov| {
            total
                .checked_add(iov.iov_len)
                .filter(|&t| t <= isize::MAX as usize)
        })
        .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))
}

/// The vectored read used by default on this build.
#[cfg(not(feature = "emulated-readv"))]
pub type PlatformReadv = NativeReadv;

/// The vectored read used by default on this build.
#[cfg(feature = "emulated-readv")]
pub type PlatformReadv = EmulatedReadv;
