use std::io;

use thiserror::Error;

/// Errors returned by recvchain setup.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket setup or an unexpected syscall failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Configuration value out of range.
    #[error("config: {0}")]
    Config(String),
}

/// A failed read attempt on one connection.
///
/// Carries the name of the failing operation and the raw OS error code so
/// the outcome stays `Copy` and comparable. Scoped to a single connection:
/// the caller is expected to tear it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{op} failed: {}", io::Error::from_raw_os_error(*errno))]
pub struct ReadError {
    /// Operation that failed, e.g. `"readv()"`.
    pub op: &'static str,
    /// Raw OS error code.
    pub errno: i32,
}

impl ReadError {
    /// Op name for a read refused before any syscall because the chain had
    /// no writable space.
    pub const COALESCE_OP: &'static str = "coalesce";

    pub(crate) fn new(op: &'static str, errno: i32) -> Self {
        ReadError { op, errno }
    }

    /// Build from an `io::Error`, falling back to `EIO` for errors that
    /// carry no OS code.
    pub(crate) fn from_io(op: &'static str, err: &io::Error) -> Self {
        ReadError {
            op,
            errno: err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// Whether the read failed with `EINVAL`.
    pub fn is_invalid_argument(&self) -> bool {
        self.errno == libc::EINVAL
    }

    /// Whether the chain had no writable space, so no read was issued and
    /// the connection is still usable.
    pub fn is_no_space(&self) -> bool {
        self.op == Self::COALESCE_OP
    }
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        io::Error::from_raw_os_error(err.errno)
    }
}
