//! The bus: request scheduling and transfer dispatch.
//!
//! `Bus::tick` is called once per cycle by an external clock. Each call:
//! 1. **Selects:** if no request is in flight, asks the arbiter for one.
//! 2. **Dispatches:** executes exactly one word of the in-flight request on its slave.
//! 3. **Advances:** on `Ok` moves the cursor; the in-flight slot is released after
//!    every completed word, so an unlocked burst can be overtaken between words.
//!    On `Wait` the slot is kept and the same word is re-dispatched next tick.
//! 4. **Decays locks:** whenever the slot ends the tick empty.
//!
//! Submission never blocks. A master polls its status, or a driver ticks the bus
//! until the status turns terminal.

use tracing::{debug, trace, warn};

use super::arbiter::{Arbiter, PriorityArbiter};
use super::directory::SlaveDirectory;
use super::observer::{
    ArbitrationEvent, BusObserver, CompletionEvent, DirectEvent, NullObserver, SubmitEvent,
    UnitEvent, UnitOutcome,
};
use super::request::{BusStatus, Operation, Request, RequestId, RequestRegistry, Transfer};
use super::traits::{Slave, SlaveStatus};
use crate::common::constants::is_word_aligned;
use crate::common::{BusError, TransferFault};

/// Shared bus connecting masters to slaves, one transfer unit per tick.
pub struct Bus {
    directory: SlaveDirectory,
    registry: RequestRegistry,
    arbiter: Box<dyn Arbiter>,
    observer: Box<dyn BusObserver>,
    /// The single in-flight slot; `None` means the bus is free for arbitration.
    current: Option<RequestId>,
    cycle: u64,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("directory", &self.directory)
            .field("registry", &self.registry)
            .field("current", &self.current)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(SlaveDirectory::new())
    }
}

impl Bus {
    /// Creates a bus over `directory` with the three-rule arbiter and no observer.
    pub fn new(directory: SlaveDirectory) -> Self {
        Self {
            directory,
            registry: RequestRegistry::new(),
            arbiter: Box::new(PriorityArbiter::new()),
            observer: Box::new(NullObserver),
            current: None,
            cycle: 0,
        }
    }

    /// Replaces the arbitration policy.
    #[must_use]
    pub fn with_arbiter(mut self, arbiter: Box<dyn Arbiter>) -> Self {
        self.arbiter = arbiter;
        self
    }

    /// Replaces the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn BusObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the event observer in place.
    pub fn set_observer(&mut self, observer: Box<dyn BusObserver>) {
        self.observer = observer;
    }

    /// Registers a slave.
    ///
    /// # Errors
    ///
    /// See [`SlaveDirectory::register`].
    pub fn attach(&mut self, slave: Box<dyn Slave>) -> Result<(), BusError> {
        self.directory.register(slave)
    }

    /// Returns the slave directory.
    pub const fn directory(&self) -> &SlaveDirectory {
        &self.directory
    }

    /// Number of ticks executed so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Priority of the request holding the in-flight slot, if any.
    pub fn in_flight(&self) -> Option<u32> {
        self.current.map(|id| self.registry.get(id).priority())
    }

    // ── Master-facing interface ─────────────────────────────────────────

    /// Starts a transaction; never blocks.
    ///
    /// `buffer` must hold at least `length` words. Read data is stored into it
    /// word by word; write data is taken from it. Get it back with
    /// [`Bus::take_buffer`] once the status is terminal.
    ///
    /// # Errors
    ///
    /// * `BusError::ReentrantSubmit` if the master's previous transaction is still running.
    /// * `BusError::ZeroLengthTransfer` if `length == 0`.
    /// * `BusError::BufferTooShort` if `buffer.len() < length`.
    pub fn submit_transfer(
        &mut self,
        priority: u32,
        operation: Operation,
        address: u64,
        length: usize,
        lock: bool,
        buffer: Vec<u32>,
    ) -> Result<(), BusError> {
        self.submit(Transfer {
            priority,
            operation,
            address,
            length,
            lock,
            buffer,
        })
    }

    /// Starts the transaction described by `transfer`; see [`Bus::submit_transfer`].
    ///
    /// # Errors
    ///
    /// See [`Bus::submit_transfer`].
    pub fn submit(&mut self, transfer: Transfer) -> Result<(), BusError> {
        let event = SubmitEvent {
            tick: self.cycle,
            priority: transfer.priority,
            operation: transfer.operation,
            address: transfer.address,
            length: transfer.length,
            lock: transfer.lock,
        };
        let _ = self.registry.submit(transfer)?;
        debug!(
            priority = event.priority,
            op = %event.operation,
            address = event.address,
            length = event.length,
            lock = event.lock,
            "submit"
        );
        self.observer.on_submit(&event);
        Ok(())
    }

    /// Non-blocking single-word read.
    ///
    /// # Errors
    ///
    /// See [`Bus::submit_transfer`].
    pub fn read(&mut self, priority: u32, address: u64, lock: bool) -> Result<(), BusError> {
        self.submit(Transfer::read(priority, address).locked(lock))
    }

    /// Non-blocking single-word write.
    ///
    /// # Errors
    ///
    /// See [`Bus::submit_transfer`].
    pub fn write(
        &mut self,
        priority: u32,
        value: u32,
        address: u64,
        lock: bool,
    ) -> Result<(), BusError> {
        self.submit(Transfer::write(priority, address, value).locked(lock))
    }

    /// Non-blocking burst read of `length` words.
    ///
    /// # Errors
    ///
    /// See [`Bus::submit_transfer`].
    pub fn burst_read(
        &mut self,
        priority: u32,
        address: u64,
        length: usize,
        lock: bool,
    ) -> Result<(), BusError> {
        self.submit(Transfer::burst_read(priority, address, length).locked(lock))
    }

    /// Non-blocking burst write of every word in `data`.
    ///
    /// # Errors
    ///
    /// See [`Bus::submit_transfer`].
    pub fn burst_write(
        &mut self,
        priority: u32,
        data: Vec<u32>,
        address: u64,
        lock: bool,
    ) -> Result<(), BusError> {
        self.submit(Transfer::burst_write(priority, address, data).locked(lock))
    }

    /// Returns the status of `priority` without side effects.
    pub fn poll(&self, priority: u32) -> BusStatus {
        self.registry.poll(priority)
    }

    /// Returns the request record of `priority`, if the master has ever submitted.
    pub fn request(&self, priority: u32) -> Option<&Request> {
        self.registry.by_priority(priority)
    }

    /// Iterates over every request record in creation order.
    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.registry.iter()
    }

    /// Returns the buffer of a finished transaction to its master.
    pub fn take_buffer(&mut self, priority: u32) -> Option<Vec<u32>> {
        self.registry.take_buffer(priority)
    }

    // ── Direct interface ────────────────────────────────────────────────

    /// Reads one word immediately, bypassing arbitration and wait states.
    ///
    /// Returns `false` and leaves `data` untouched if the address is misaligned or
    /// unmapped, or if the slave refuses the access.
    pub fn direct_read(&mut self, data: &mut u32, address: u64) -> bool {
        let ok = self.direct_access(address, |slave| slave.direct_read(data, address));
        self.observer.on_direct(&DirectEvent {
            tick: self.cycle,
            operation: Operation::Read,
            address,
            ok,
        });
        ok
    }

    /// Writes one word immediately, bypassing arbitration and wait states.
    ///
    /// Returns `false` if the address is misaligned or unmapped, or if the slave
    /// refuses the access.
    pub fn direct_write(&mut self, data: u32, address: u64) -> bool {
        let ok = self.direct_access(address, |slave| slave.direct_write(data, address));
        self.observer.on_direct(&DirectEvent {
            tick: self.cycle,
            operation: Operation::Write,
            address,
            ok,
        });
        ok
    }

    fn direct_access(&mut self, address: u64, access: impl FnOnce(&mut dyn Slave) -> bool) -> bool {
        if !is_word_aligned(address) {
            warn!("{}", TransferFault::MisalignedAddress(address));
            return false;
        }
        match self.directory.resolve(address) {
            Some(slave) => access(slave),
            None => {
                warn!("{}", TransferFault::UnmappedAddress(address));
                false
            }
        }
    }

    // ── Scheduling ──────────────────────────────────────────────────────

    /// Advances the bus by one cycle.
    ///
    /// Returns the unit dispatched this tick, or `None` if the bus stayed idle.
    ///
    /// # Errors
    ///
    /// Returns `BusError::DuplicatePendingPriority` (or `UnknownGrant` from a custom
    /// arbiter) when arbitration detects a contract violation. The bus state is
    /// unspecified afterwards and the run should be abandoned.
    pub fn tick(&mut self) -> Result<Option<UnitEvent>, BusError> {
        let tick = self.cycle;
        self.cycle += 1;

        if self.current.is_none() {
            self.current = self.next_request(tick)?;
        }

        let unit = match self.current {
            Some(id) => Some(self.handle_request(id, tick)),
            None => None,
        };

        if self.current.is_none() {
            self.registry.decay_locks();
        }

        self.observer.on_tick(tick, unit.is_some());
        Ok(unit)
    }

    /// Collects the runnable requests and lets the arbiter choose one.
    fn next_request(&mut self, tick: u64) -> Result<Option<RequestId>, BusError> {
        let runnable = self.registry.runnable();
        if runnable.is_empty() {
            return Ok(None);
        }

        let candidates: Vec<&Request> = runnable.iter().map(|&id| self.registry.get(id)).collect();
        let Some(grant) = self.arbiter.arbitrate(&candidates)? else {
            return Ok(None);
        };

        let id = runnable
            .iter()
            .copied()
            .find(|&id| self.registry.get(id).priority() == grant.priority)
            .ok_or(BusError::UnknownGrant {
                priority: grant.priority,
            })?;

        self.registry.get_mut(id).lock = grant.lock;
        self.observer.on_arbitration(&ArbitrationEvent {
            tick,
            winner: grant.priority,
            rule: grant.rule,
            rejected: grant.rejected,
        });
        Ok(Some(id))
    }

    /// Executes one transfer unit of the in-flight request.
    fn handle_request(&mut self, id: RequestId, tick: u64) -> UnitEvent {
        let request = self.registry.get_mut(id);
        let priority = request.priority();
        let operation = request.operation();
        let address = request.cursor_address();

        let outcome = if !is_word_aligned(address) {
            UnitOutcome::Fault(TransferFault::MisalignedAddress(address))
        } else if let Some(slave) = self.directory.resolve(address) {
            request.status = BusStatus::Wait;
            let status = match operation {
                Operation::Read => {
                    let mut word = request.current_word();
                    let status = slave.read(&mut word, address);
                    if status == SlaveStatus::Ok {
                        if let Some(slot) = request.current_word_mut() {
                            *slot = word;
                        }
                    }
                    status
                }
                Operation::Write => slave.write(request.current_word(), address),
            };
            match status {
                SlaveStatus::Ok => UnitOutcome::Done,
                SlaveStatus::Wait => UnitOutcome::Wait,
                SlaveStatus::Error => UnitOutcome::Fault(TransferFault::SlaveError(address)),
            }
        } else {
            UnitOutcome::Fault(TransferFault::UnmappedAddress(address))
        };

        let completion = match outcome {
            UnitOutcome::Fault(fault) => {
                warn!(priority, "bus error: {fault}");
                request.status = BusStatus::Error;
                request.fault = Some(fault);
                self.current = None;
                Some(request.status)
            }
            UnitOutcome::Wait => {
                trace!(priority, address, "slave wait");
                None
            }
            UnitOutcome::Done => {
                request.advance();
                self.current = None;
                if request.is_exhausted() {
                    request.status = BusStatus::Ok;
                    Some(request.status)
                } else {
                    None
                }
            }
        };

        if let Some(status) = completion {
            let words = request.words_done();
            debug!(priority, %status, words, "transfer done");
            self.observer.on_complete(&CompletionEvent {
                tick,
                priority,
                status,
                words,
            });
        }

        let unit = UnitEvent {
            tick,
            priority,
            operation,
            address,
            outcome,
        };
        self.observer.on_unit(&unit);
        unit
    }
}
