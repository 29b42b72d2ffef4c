//! recvchain receive-path metrics.
//!
//! Process-wide counters for read attempts, their outcomes, and bytes
//! received. Exposed through metriken's registry like any other `#[metric]`.

use metriken::{Counter, metric};

// ── Read attempts ────────────────────────────────────────────────

#[metric(
    name = "recvchain/readv/calls",
    description = "Vectored read syscalls issued"
)]
pub static READV_CALLS: Counter = Counter::new();

#[metric(
    name = "recvchain/readv/skipped",
    description = "Reads answered from cached readiness without a syscall"
)]
pub static READV_SKIPPED: Counter = Counter::new();

#[metric(
    name = "recvchain/readv/interrupted",
    description = "Reads re-issued after EINTR"
)]
pub static READV_INTERRUPTED: Counter = Counter::new();

// ── Outcomes ─────────────────────────────────────────────────────

#[metric(
    name = "recvchain/readv/would_block",
    description = "Reads that returned EAGAIN"
)]
pub static READV_WOULD_BLOCK: Counter = Counter::new();

#[metric(name = "recvchain/readv/eof", description = "Reads that hit end of stream")]
pub static READV_EOF: Counter = Counter::new();

#[metric(
    name = "recvchain/readv/errors",
    description = "Reads that failed the connection"
)]
pub static READV_ERRORS: Counter = Counter::new();

// ── Bytes ────────────────────────────────────────────────────────

#[metric(name = "recvchain/bytes/received", description = "Total bytes received")]
pub static BYTES_RECEIVED: Counter = Counter::new();
