//! Word-addressed memory slave with optional wait states.
//!
//! With zero wait states every access completes in the tick it is dispatched
//! ("fast memory"). With `n` wait states the first dispatch of a word answers
//! `Wait` and arms a countdown; the bus re-dispatches the same word every tick
//! and the slave keeps answering `Wait` until `n` ticks have passed, then it
//! transfers the word and answers `Ok` ("slow memory").

use crate::bus::traits::{Slave, SlaveStatus};
use crate::common::BusError;
use crate::common::constants::{WORD_BYTES, is_word_aligned};

/// Largest range a memory will back, in bytes.
pub const MAX_MEMORY_BYTES: u64 = 1 << 32;

/// A wait-state access currently being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingAccess {
    address: u64,
    remaining: u32,
}

/// Memory covering `[start, end]` with word granularity.
#[derive(Debug, Clone)]
pub struct Memory {
    name: String,
    start: u64,
    end: u64,
    wait_states: u32,
    words: Vec<u32>,
    pending: Option<PendingAccess>,
}

impl Memory {
    /// Creates a zero-filled memory.
    ///
    /// # Errors
    ///
    /// Returns `BusError::InvalidSlaveRange` if `start > end`, either bound is not
    /// word aligned, or the range exceeds [`MAX_MEMORY_BYTES`].
    pub fn new(
        name: impl Into<String>,
        start: u64,
        end: u64,
        wait_states: u32,
    ) -> Result<Self, BusError> {
        let name = name.into();
        if start > end || !is_word_aligned(start) || !is_word_aligned(end.wrapping_add(1)) {
            return Err(BusError::InvalidSlaveRange { name, start, end });
        }
        let Some(bytes) = (end - start)
            .checked_add(1)
            .filter(|&bytes| bytes <= MAX_MEMORY_BYTES)
        else {
            return Err(BusError::InvalidSlaveRange { name, start, end });
        };
        let len = (bytes / WORD_BYTES) as usize;
        Ok(Self {
            name,
            start,
            end,
            wait_states,
            words: vec![0; len],
            pending: None,
        })
    }

    /// Memory that never inserts wait states.
    ///
    /// # Errors
    ///
    /// See [`Memory::new`].
    pub fn fast(name: impl Into<String>, start: u64, end: u64) -> Result<Self, BusError> {
        Self::new(name, start, end, 0)
    }

    /// Memory inserting `wait_states` ticks before each word completes.
    ///
    /// # Errors
    ///
    /// See [`Memory::new`].
    pub fn slow(
        name: impl Into<String>,
        start: u64,
        end: u64,
        wait_states: u32,
    ) -> Result<Self, BusError> {
        Self::new(name, start, end, wait_states)
    }

    /// Number of wait states per word.
    pub const fn wait_states(&self) -> u32 {
        self.wait_states
    }

    /// Returns the stored word at `address` without side effects.
    pub fn peek(&self, address: u64) -> Option<u32> {
        self.index(address).map(|i| self.words[i])
    }

    /// Stores `value` at `address` without side effects; returns `false` if out of range.
    pub fn poke(&mut self, address: u64, value: u32) -> bool {
        match self.index(address) {
            Some(i) => {
                self.words[i] = value;
                true
            }
            None => false,
        }
    }

    fn index(&self, address: u64) -> Option<usize> {
        if address < self.start || address > self.end || !is_word_aligned(address) {
            return None;
        }
        Some(((address - self.start) / WORD_BYTES) as usize)
    }

    /// Counts down the wait states of the access to `address`.
    ///
    /// Returns `true` once the word may be transferred.
    fn ready(&mut self, address: u64) -> bool {
        if self.wait_states == 0 {
            return true;
        }
        match self.pending {
            Some(PendingAccess { address: a, remaining }) if a == address => {
                if remaining <= 1 {
                    self.pending = None;
                    true
                } else {
                    self.pending = Some(PendingAccess {
                        address,
                        remaining: remaining - 1,
                    });
                    false
                }
            }
            _ => {
                self.pending = Some(PendingAccess {
                    address,
                    remaining: self.wait_states,
                });
                false
            }
        }
    }
}

impl Slave for Memory {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_address(&self) -> u64 {
        self.start
    }

    fn end_address(&self) -> u64 {
        self.end
    }

    fn read(&mut self, data: &mut u32, address: u64) -> SlaveStatus {
        let Some(i) = self.index(address) else {
            return SlaveStatus::Error;
        };
        if !self.ready(address) {
            return SlaveStatus::Wait;
        }
        *data = self.words[i];
        SlaveStatus::Ok
    }

    fn write(&mut self, data: u32, address: u64) -> SlaveStatus {
        let Some(i) = self.index(address) else {
            return SlaveStatus::Error;
        };
        if !self.ready(address) {
            return SlaveStatus::Wait;
        }
        self.words[i] = data;
        SlaveStatus::Ok
    }

    fn direct_read(&mut self, data: &mut u32, address: u64) -> bool {
        match self.peek(address) {
            Some(word) => {
                *data = word;
                true
            }
            None => false,
        }
    }

    fn direct_write(&mut self, data: u32, address: u64) -> bool {
        self.poke(address, data)
    }
}
