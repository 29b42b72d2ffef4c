//! Read outcomes and syscall result classification.

use std::io;

use crate::error::ReadError;

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes landed in the chain, in chain order.
    Bytes(usize),
    /// Nothing to read right now; re-arm read interest and retry later.
    WouldBlock,
    /// Peer closed its side cleanly.
    Eof,
    /// The read failed. Connection-fatal, and the caller should tear the
    /// connection down, unless [`ReadError::is_no_space`] says the chain
    /// simply had nowhere to put data.
    Error(ReadError),
}

impl ReadOutcome {
    /// Bytes transferred, 0 for every other outcome.
    pub fn bytes(&self) -> usize {
        match self {
            ReadOutcome::Bytes(n) => *n,
            _ => 0,
        }
    }

    /// Whether the caller should stop reading from this connection.
    pub fn is_terminal(&self) -> bool {
        match self {
            ReadOutcome::Eof => true,
            ReadOutcome::Error(err) => !err.is_no_space(),
            _ => false,
        }
    }
}

/// Classification of a single raw read result.
#[derive(Debug)]
pub(crate) enum Step {
    Transferred(usize),
    Eof,
    WouldBlock,
    /// Re-issue the same call.
    Interrupted,
    Fatal(io::Error),
}

pub(crate) fn classify(result: io::Result<usize>) -> Step {
    match result {
        Ok(0) => Step::Eof,
        Ok(n) => Step::Transferred(n),
        Err(err) => match err.kind() {
            io::ErrorKind::WouldBlock => Step::WouldBlock,
            io::ErrorKind::Interrupted => Step::Interrupted,
            _ => Step::Fatal(err),
        },
    }
}
