//! Caller-owned receive buffers.

pub mod chain;
