//! Slave trait for bus-attached resources.
//!
//! This module defines the `Slave` trait implemented by every component that owns an
//! address range on the bus. It provides:
//! 1. **Identification:** `name`, `start_address` and `end_address` for routing.
//! 2. **Bus access:** One-word `read`/`write` answering `Ok`, `Error`, or `Wait`.
//! 3. **Direct access:** Immediate `direct_read`/`direct_write` that bypass wait states.
//!
//! Implementors must be `Send` so a bus can be moved behind a `SharedBus`.

use serde::Serialize;
use std::fmt;

/// Outcome of dispatching one word to a slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlaveStatus {
    /// The word was transferred.
    Ok,
    /// The slave rejected the access.
    Error,
    /// The slave needs more ticks; the same word must be dispatched again.
    Wait,
}

impl fmt::Display for SlaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Wait => "WAIT",
        };
        f.write_str(s)
    }
}

/// An addressable resource attached to the bus.
///
/// Addresses passed to the access methods are absolute byte addresses inside
/// `start_address()..=end_address()`; they are always word aligned when they
/// come from the bus.
pub trait Slave: Send {
    /// Returns a short name for this slave (e.g., `"mem_fast"`).
    fn name(&self) -> &str;
    /// Returns the first byte address owned by this slave.
    fn start_address(&self) -> u64;
    /// Returns the last byte address owned by this slave (inclusive).
    fn end_address(&self) -> u64;

    /// Reads the word at `address` into `data`.
    ///
    /// `data` is only written when `SlaveStatus::Ok` is returned.
    fn read(&mut self, data: &mut u32, address: u64) -> SlaveStatus;
    /// Writes `data` to the word at `address`.
    fn write(&mut self, data: u32, address: u64) -> SlaveStatus;

    /// Reads the word at `address` immediately, ignoring wait states.
    fn direct_read(&mut self, data: &mut u32, address: u64) -> bool;
    /// Writes the word at `address` immediately, ignoring wait states.
    fn direct_write(&mut self, data: u32, address: u64) -> bool;

    /// Returns `true` if `address` falls inside this slave's range.
    fn contains(&self, address: u64) -> bool {
        self.start_address() <= address && address <= self.end_address()
    }
}
