//! Lock-free transmit accounting.
//!
//! The counter block is the only mutable state shared between the
//! transmit hot path and diagnostics readers, so it uses plain atomics
//! throughout: read-modify-write on the transmit side, acquire loads on
//! the reader side, never a mutex.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of a device's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Frames handed off for transmission.
    pub tx_packets: u64,

    /// Payload bytes handed off for transmission.
    pub tx_bytes: u64,
}

/// Per-device transmit counters.
///
/// Both counters are monotonically non-decreasing for the life of the
/// device and start at zero. There is no reset.
#[derive(Debug, Default)]
pub struct CounterBlock {
    tx_packets: AtomicU64,
    tx_bytes: AtomicU64,
}

impl CounterBlock {
    /// Creates a zeroed counter block.
    pub const fn new() -> Self {
        Self {
            tx_packets: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
        }
    }

    /// Accounts one transmitted frame of `byte_count` bytes.
    ///
    /// Each counter's increment is independently atomic; the pair is not
    /// one transaction. A reader may observe `tx_packets` incremented
    /// before `tx_bytes`. Only the transmit path calls this; outside the
    /// crate the counters are read-only.
    pub(crate) fn record_transmit(&self, byte_count: u64) {
        self.tx_packets.fetch_add(1, Ordering::Relaxed);
        self.tx_bytes.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Reads both counters.
    ///
    /// Each load is atomic (no torn reads) and carries acquire
    /// semantics; the two loads are independent of each other.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            tx_packets: self.tx_packets.load(Ordering::Acquire),
            tx_bytes: self.tx_bytes.load(Ordering::Acquire),
        }
    }
}
