//! Master models driving traffic onto the bus.
//!
//! Each master is a small state machine stepped once per cycle, before the bus
//! ticks. A master that "blocks" on a transfer simply stays in its waiting phase
//! and polls its status every cycle until it turns terminal.

use tracing::{debug, warn};

use crate::bus::Bus;
use crate::bus::request::BusStatus;
use crate::common::BusError;
use crate::common::constants::WORD_BYTES;

/// Size of the window walked by the non-blocking master before wrapping.
const NON_BLOCKING_WINDOW: u64 = 0x80;

/// Words dumped per round by the direct master.
const DIRECT_WORDS: usize = 4;

/// A bus master stepped once per cycle.
pub trait Master: Send {
    /// Master name used in logs.
    fn name(&self) -> &str;

    /// Performs this master's work for `cycle`, before the bus tick of that cycle.
    ///
    /// # Errors
    ///
    /// Propagates submission contract violations from the bus.
    fn tick(&mut self, bus: &mut Bus, cycle: u64) -> Result<(), BusError>;
}

/// Logs a transfer that ended in error; returns `true` if it did.
fn report(name: &str, bus: &Bus, priority: u32, what: &str) -> bool {
    if bus.poll(priority) != BusStatus::Error {
        return false;
    }
    let fault = bus.request(priority).and_then(|r| r.fault());
    match fault {
        Some(fault) => warn!(master = name, "{what} failed: {fault}"),
        None => warn!(master = name, "{what} failed"),
    }
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BurstPhase {
    Start,
    Reading,
    Modify { data: Vec<u32>, next: usize },
    Writing,
    Sleeping { until: u64 },
}

/// Burst read-modify-write master.
///
/// Reads `length` words, spends one cycle per word adding the word's index to
/// it, writes the words back, then sleeps `timeout` cycles.
#[derive(Debug, Clone)]
pub struct BlockingMaster {
    name: String,
    priority: u32,
    address: u64,
    length: usize,
    lock: bool,
    timeout: u64,
    phase: BurstPhase,
    rounds: u64,
    errors: u64,
}

impl BlockingMaster {
    /// Creates the master; it submits its first burst on its first cycle.
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        address: u64,
        length: usize,
        lock: bool,
        timeout: u64,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            address,
            length,
            lock,
            timeout,
            phase: BurstPhase::Start,
            rounds: 0,
            errors: 0,
        }
    }

    /// Completed read-modify-write rounds.
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Transfers that ended in error.
    pub const fn errors(&self) -> u64 {
        self.errors
    }

    fn start(&mut self, bus: &mut Bus) -> Result<BurstPhase, BusError> {
        bus.burst_read(self.priority, self.address, self.length, self.lock)?;
        Ok(BurstPhase::Reading)
    }
}

impl Master for BlockingMaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, bus: &mut Bus, cycle: u64) -> Result<(), BusError> {
        let phase = std::mem::replace(&mut self.phase, BurstPhase::Start);
        self.phase = match phase {
            BurstPhase::Start => self.start(bus)?,
            BurstPhase::Reading if bus.poll(self.priority).is_terminal() => {
                if report(&self.name, bus, self.priority, "burst read") {
                    self.errors += 1;
                }
                let mut data = bus.take_buffer(self.priority).unwrap_or_default();
                data.resize(self.length, 0);
                BurstPhase::Modify { data, next: 0 }
            }
            BurstPhase::Modify { mut data, next } => {
                if let Some(word) = data.get_mut(next) {
                    *word = word.wrapping_add(next as u32);
                }
                if next + 1 < data.len() {
                    BurstPhase::Modify {
                        data,
                        next: next + 1,
                    }
                } else {
                    // The write goes out on the cycle of the last modified word.
                    bus.burst_write(self.priority, data, self.address, self.lock)?;
                    BurstPhase::Writing
                }
            }
            BurstPhase::Writing if bus.poll(self.priority).is_terminal() => {
                if report(&self.name, bus, self.priority, "burst write") {
                    self.errors += 1;
                }
                let _ = bus.take_buffer(self.priority);
                self.rounds += 1;
                debug!(master = %self.name, round = self.rounds, "burst round done");
                BurstPhase::Sleeping {
                    until: cycle + self.timeout,
                }
            }
            BurstPhase::Sleeping { until } if cycle >= until => self.start(bus)?,
            waiting => waiting,
        };
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordPhase {
    Start,
    Reading,
    Modify { value: u32 },
    Writing,
    Sleeping { until: u64 },
}

/// Single-word read-modify-write master walking an address window.
///
/// Each round reads one word, adds a running counter, writes it back, sleeps
/// `timeout` cycles and moves to the next word. After `start + 0x80` it wraps
/// to `start` and resets the counter.
#[derive(Debug, Clone)]
pub struct NonBlockingMaster {
    name: String,
    priority: u32,
    start_address: u64,
    address: u64,
    lock: bool,
    timeout: u64,
    counter: u32,
    phase: WordPhase,
    rounds: u64,
    errors: u64,
}

impl NonBlockingMaster {
    /// Creates the master; it submits its first read on its first cycle.
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        start_address: u64,
        lock: bool,
        timeout: u64,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            start_address,
            address: start_address,
            lock,
            timeout,
            counter: 0,
            phase: WordPhase::Start,
            rounds: 0,
            errors: 0,
        }
    }

    /// Address of the word handled by the current round.
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// Completed read-modify-write rounds.
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Transfers that ended in error.
    pub const fn errors(&self) -> u64 {
        self.errors
    }

    fn start(&mut self, bus: &mut Bus) -> Result<WordPhase, BusError> {
        bus.read(self.priority, self.address, self.lock)?;
        Ok(WordPhase::Reading)
    }
}

impl Master for NonBlockingMaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, bus: &mut Bus, cycle: u64) -> Result<(), BusError> {
        let phase = self.phase;
        self.phase = match phase {
            WordPhase::Start => self.start(bus)?,
            WordPhase::Reading if bus.poll(self.priority).is_terminal() => {
                if report(&self.name, bus, self.priority, "read") {
                    self.errors += 1;
                }
                let word = bus
                    .take_buffer(self.priority)
                    .and_then(|b| b.first().copied())
                    .unwrap_or(0);
                let value = word.wrapping_add(self.counter);
                self.counter = self.counter.wrapping_add(1);
                WordPhase::Modify { value }
            }
            WordPhase::Modify { value } => {
                bus.write(self.priority, value, self.address, self.lock)?;
                WordPhase::Writing
            }
            WordPhase::Writing if bus.poll(self.priority).is_terminal() => {
                if report(&self.name, bus, self.priority, "write") {
                    self.errors += 1;
                }
                self.rounds += 1;
                WordPhase::Sleeping {
                    until: cycle + self.timeout,
                }
            }
            WordPhase::Sleeping { until } if cycle >= until => {
                self.address += WORD_BYTES;
                if self.address > self.start_address + NON_BLOCKING_WINDOW {
                    self.address = self.start_address;
                    self.counter = 0;
                }
                self.start(bus)?
            }
            waiting => waiting,
        };
        Ok(())
    }
}

/// Debug master dumping four words through the direct interface.
#[derive(Debug, Clone)]
pub struct DirectMaster {
    name: String,
    address: u64,
    timeout: u64,
    next_at: u64,
    last_dump: Option<[u32; DIRECT_WORDS]>,
}

impl DirectMaster {
    /// Creates the master; the first dump happens after `timeout` cycles.
    pub fn new(name: impl Into<String>, address: u64, timeout: u64) -> Self {
        Self {
            name: name.into(),
            address,
            timeout,
            next_at: timeout,
            last_dump: None,
        }
    }

    /// Words read by the most recent fully successful dump.
    pub const fn last_dump(&self) -> Option<[u32; DIRECT_WORDS]> {
        self.last_dump
    }
}

impl Master for DirectMaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, bus: &mut Bus, cycle: u64) -> Result<(), BusError> {
        if cycle < self.next_at {
            return Ok(());
        }
        self.next_at = cycle + self.timeout.max(1);

        let mut words = [0u32; DIRECT_WORDS];
        let mut ok = true;
        for (i, word) in words.iter_mut().enumerate() {
            ok &= bus.direct_read(word, self.address + i as u64 * WORD_BYTES);
        }
        if ok {
            debug!(
                master = %self.name,
                "mem[{:#x}:{:#x}] = ({:#x} {:#x} {:#x} {:#x})",
                self.address,
                self.address + (DIRECT_WORDS as u64 - 1) * WORD_BYTES,
                words[0],
                words[1],
                words[2],
                words[3]
            );
            self.last_dump = Some(words);
        } else {
            warn!(master = %self.name, address = self.address, "direct read failed");
        }
        Ok(())
    }
}
