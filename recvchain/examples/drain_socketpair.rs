//! Drain a socketpair through the receive pipeline.
//!
//! Usage: `drain_socketpair [backend] [limit]`
//!
//! Writes a message into one end, then reads it back through a two-segment
//! chain in `limit`-byte steps until the peer's close is seen. Set
//! `RUST_LOG=debug` to watch each readv.

use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

use recvchain::{Backend, ConfigBuilder, Connection, ReadOutcome, Segment, advance_chain};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), recvchain::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let backend = match std::env::args().nth(1).as_deref() {
        Some("precise-count") => Backend::PreciseCount,
        Some("eof-flag") => Backend::EofFlag,
        Some("query-after-read") => Backend::QueryAfterRead,
        Some("best-effort") => Backend::BestEffort,
        Some("plain") => Backend::Plain,
        _ => Backend::detect(),
    };
    let limit: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let config = ConfigBuilder::new().backend(backend).build()?;
    let (rx, tx) = recvchain::sys::stream_pair()?;

    let message = b"the quick brown fox jumps over the lazy dog\n".repeat(8);
    let mut writer = UnixStream::from(tx);
    writer.write_all(&message)?;
    drop(writer);

    let mut conn = Connection::with_config(rx.as_raw_fd(), &config);
    // Stand in for the event loop: one notification carrying what we know.
    match backend {
        Backend::PreciseCount => conn.read.notify(message.len() as i64),
        _ => conn.read.notify(-1),
    }
    conn.read.notify_eof(0);

    let mut storage = vec![0u8; message.len() + 64];
    let (head, tail) = storage.split_at_mut(100);
    let mut chain = [Segment::new(head), Segment::new(tail)];

    let mut total = 0;
    loop {
        match conn.readv_chain(&mut chain, limit) {
            ReadOutcome::Bytes(n) => {
                advance_chain(&mut chain, n);
                total += n;
                println!("read {n} bytes ({total} total)");
            }
            ReadOutcome::WouldBlock => {
                println!("would block");
                break;
            }
            ReadOutcome::Eof => {
                println!("eof after {total} bytes");
                break;
            }
            ReadOutcome::Error(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }

    assert_eq!(&storage[..total], &message[..total]);
    println!("backend {backend}: {total} of {} bytes", message.len());
    Ok(())
}
