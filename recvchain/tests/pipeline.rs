//! Integration tests: receive pipeline over real non-blocking socketpairs.
//!
//! Each test writes a known byte stream into one end of a Unix stream
//! socketpair and drains the other end through `Connection::readv_chain`.

use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use recvchain::{
    Backend, Config, Connection, EmulatedReadv, IoVecs, NativeReadv, ReadError, ReadOutcome,
    Segment, VectoredRead, advance_chain, sys,
};
use tracing::Span;
use tracing_test::traced_test;

// ── Helpers ─────────────────────────────────────────────────────────

fn send(fd: &OwnedFd, data: &[u8]) {
    let ret = unsafe { libc::write(fd.as_raw_fd(), data.as_ptr().cast(), data.len()) };
    assert_eq!(ret, data.len() as isize, "short write to socketpair");
}

fn config(backend: Backend) -> Config {
    Config {
        backend,
        ..Config::default()
    }
}

/// Chain of three segments: A and B adjacent, C separated by one byte.
/// Storage layout: `[A:4][B:4][gap:1][C:8]`.
fn abc_chain(storage: &mut [u8; 17]) -> Vec<Segment<'_>> {
    let (ab, rest) = storage.split_at_mut(8);
    let (a, b) = ab.split_at_mut(4);
    let c = &mut rest[1..];
    vec![Segment::new(a), Segment::new(b), Segment::new(c)]
}

/// Drain `pattern` through `reader` with `limit`, returning the outcome of
/// the first read and the resulting storage.
fn read_once<R: VectoredRead>(reader: R, pattern: &[u8], limit: usize) -> (ReadOutcome, [u8; 17]) {
    let (rx, tx) = sys::stream_pair().unwrap();
    send(&tx, pattern);

    let mut storage = [0u8; 17];
    let outcome = {
        let mut chain = abc_chain(&mut storage);
        let mut conn = Connection::with_reader(rx.as_raw_fd(), &config(Backend::Plain), reader);
        conn.readv_chain(&mut chain, limit)
    };
    (outcome, storage)
}

// ── End to end ──────────────────────────────────────────────────────

#[test]
fn adjacent_segments_read_in_one_call() {
    let pattern = b"AAAABBBBCCCCCCCC";

    let mut storage = [0u8; 17];
    {
        let mut chain = abc_chain(&mut storage);
        let iovs = IoVecs::coalesce(&mut chain, 0);
        let lens: Vec<usize> = iovs.as_slice().iter().map(|iov| iov.iov_len).collect();
        assert_eq!(lens, vec![8, 8]);
    }

    let (rx, tx) = sys::stream_pair().unwrap();
    send(&tx, pattern);

    let mut conn = Connection::with_config(rx.as_raw_fd(), &config(Backend::QueryAfterRead));
    conn.read.notify(-1);
    let outcome = {
        let mut chain = abc_chain(&mut storage);
        conn.readv_chain(&mut chain, 0)
    };

    assert_eq!(outcome, ReadOutcome::Bytes(16));
    assert_eq!(&storage[..8], b"AAAABBBB");
    assert_eq!(&storage[9..], b"CCCCCCCC");
    // Full read triggered FIONREAD, which found nothing left.
    assert_eq!(conn.read.available, 0);
    assert!(!conn.read.ready);
}

#[test]
fn drain_until_eof() {
    let (rx, tx) = sys::stream_pair().unwrap();
    let message: Vec<u8> = (0..200u8).collect();
    send(&tx, &message);
    drop(tx);

    let mut conn = Connection::with_config(rx.as_raw_fd(), &config(Backend::BestEffort));
    conn.read.notify(-1);

    let mut storage = vec![0u8; 256];
    let (front, back) = storage.split_at_mut(48);
    let (middle, back) = back.split_at_mut(100);
    let mut chain = [Segment::new(front), Segment::new(middle), Segment::new(back)];

    let mut total = 0;
    let mut reads = 0;
    loop {
        match conn.readv_chain(&mut chain, 64) {
            ReadOutcome::Bytes(n) => {
                assert!(n <= 64);
                assert_eq!(advance_chain(&mut chain, n), 0);
                total += n;
                reads += 1;
            }
            ReadOutcome::Eof => break,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(total, 200);
    assert_eq!(reads, 4);
    assert!(conn.read.eof);
    assert!(!conn.read.ready);
    drop(chain);
    assert_eq!(&storage[..200], &message[..]);
}

// ── Emulation equivalence ───────────────────────────────────────────

#[test]
fn emulated_readv_matches_native_for_all_limits() {
    let pattern = b"0123456789ABCDEFGHIJ";
    // unlimited, one byte, the A|B boundary, the AB|C boundary, beyond total
    for limit in [0, 1, 4, 8, 64] {
        let (native_outcome, native) = read_once(NativeReadv, pattern, limit);
        let (emulated_outcome, emulated) = read_once(EmulatedReadv, pattern, limit);

        assert_eq!(native_outcome, emulated_outcome, "limit {limit}");
        assert_eq!(native, emulated, "limit {limit}");

        let expected = if limit == 0 { 16 } else { limit.min(16) };
        assert_eq!(native_outcome, ReadOutcome::Bytes(expected), "limit {limit}");

        // Reassemble in chain order and compare with the stream prefix.
        let mut rebuilt = native[..8].to_vec();
        rebuilt.extend_from_slice(&native[9..]);
        assert_eq!(&rebuilt[..expected], &pattern[..expected], "limit {limit}");
        assert!(rebuilt[expected..].iter().all(|&b| b == 0), "limit {limit}");
    }
}

#[test]
fn emulated_readv_short_stream() {
    let (native_outcome, native) = read_once(NativeReadv, b"abcdefghij", 0);
    let (emulated_outcome, emulated) = read_once(EmulatedReadv, b"abcdefghij", 0);
    assert_eq!(native_outcome, ReadOutcome::Bytes(10));
    assert_eq!(emulated_outcome, native_outcome);
    assert_eq!(native, emulated);
}

// ── Retry and errors ────────────────────────────────────────────────

/// Returns `EINTR` a fixed number of times, then reads for real.
struct Interrupting<R> {
    remaining: usize,
    inner: R,
}

impl<R: VectoredRead> VectoredRead for Interrupting<R> {
    fn read_vectored(&mut self, fd: RawFd, iovecs: &mut IoVecs<'_, '_>, log: &Span) -> io::Result<usize> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Err(io::Error::from_raw_os_error(libc::EINTR));
        }
        self.inner.read_vectored(fd, iovecs, log)
    }
}

#[test]
fn interrupted_reads_reach_a_terminal_outcome() {
    for interrupts in [0, 1, 5, 50] {
        let (rx, tx) = sys::stream_pair().unwrap();
        send(&tx, b"data");

        let reader = Interrupting {
            remaining: interrupts,
            inner: EmulatedReadv,
        };
        let mut conn = Connection::with_reader(rx.as_raw_fd(), &config(Backend::Plain), reader);
        let mut storage = [0u8; 8];
        let mut chain = [Segment::new(&mut storage)];

        assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::Bytes(4));
    }
}

#[traced_test]
#[test]
fn fatal_error_is_logged_with_operation() {
    let mut conn = Connection::with_config(-1, &config(Backend::Plain));
    let mut storage = [0u8; 8];
    let mut chain = [Segment::new(&mut storage)];

    match conn.readv_chain(&mut chain, 0) {
        ReadOutcome::Error(ReadError { op, errno }) => {
            assert_eq!(op, "readv()");
            assert_eq!(errno, libc::EBADF);
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(conn.read.error);
    assert!(logs_contain("connection read failed"));
    assert!(logs_contain("readv()"));
}

#[test]
fn precise_count_bookkeeping_across_reads() {
    let (rx, tx) = sys::stream_pair().unwrap();
    send(&tx, &[7u8; 30]);

    let mut conn = Connection::with_config(rx.as_raw_fd(), &config(Backend::PreciseCount));
    conn.read.notify(30);

    let mut storage = [0u8; 12];
    let mut chain = [Segment::new(&mut storage)];

    assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::Bytes(12));
    assert_eq!(conn.read.available, 18);
    assert!(conn.read.ready);

    assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::Bytes(12));
    assert_eq!(conn.read.available, 6);
    assert!(conn.read.ready);

    assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::Bytes(6));
    assert_eq!(conn.read.available, 0);
    assert!(!conn.read.ready);

    // Cached count is zero: answered without touching the socket.
    assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::WouldBlock);
}

#[test]
fn precise_count_zero_read_drops_stale_count() {
    let (rx, tx) = sys::stream_pair().unwrap();
    drop(tx);

    let mut conn = Connection::with_config(rx.as_raw_fd(), &config(Backend::PreciseCount));
    // Backend still believes bytes are queued.
    conn.read.notify(10);

    let mut storage = [0u8; 8];
    let mut chain = [Segment::new(&mut storage)];
    assert_eq!(conn.readv_chain(&mut chain, 0), ReadOutcome::Eof);
    assert_eq!(conn.read.available, 0);
    assert!(conn.read.eof);
}
