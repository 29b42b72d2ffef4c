//! Thin `libc` wrappers returning `io::Result`.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

/// `readv(2)`. The iovec count must already be within `IOV_MAX`.
///
/// # Safety
///
/// Every iovec must describe memory that is valid for writes of `iov_len`
/// bytes and not aliased for the duration of the call.
pub unsafe fn readv(fd: RawFd, iovecs: &[libc::iovec]) -> io::Result<usize> {
    let ret = unsafe { libc::readv(fd, iovecs.as_ptr(), iovecs.len() as libc::c_int) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as usize)
}

/// `read(2)` into a single buffer.
pub fn read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as usize)
}

/// Bytes pending in the socket receive queue (`ioctl(FIONREAD)`).
pub fn nread(fd: RawFd) -> io::Result<i64> {
    let mut n: libc::c_int = 0;
    let ret = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut n as *mut libc::c_int) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as i64)
}

/// Set `O_NONBLOCK` on a descriptor.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if flags & libc::O_NONBLOCK != 0 {
        return Ok(());
    }
    let ret = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// A connected pair of non-blocking Unix stream sockets.
pub fn stream_pair() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    let ret = unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr()) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // Safety: socketpair succeeded, both descriptors are open and owned here.
    let (a, b) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    for fd in [fds[0], fds[1]] {
        set_nonblocking(fd)?;
    }
    Ok((a, b))
}
