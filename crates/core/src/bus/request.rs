//! Request records and the registry that owns them.
//!
//! Every master identity (its unique priority value) owns exactly one request
//! record. The record is created on the first submission and reused for every
//! later transaction of that master; the registry only grows.
//!
//! # Lock lifecycle
//!
//! ```text
//!   submit(lock)         submit(lock) / rule-3 grant
//! None ───────────► Set ───────────────────────────► Granted
//!   ▲                │ ▲                                 │
//!   │ bus idle       │ │            bus idle             │
//!   └────────────────┘ └─────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;

use crate::common::constants::{WORD_BYTES, burst_end_address};
use crate::common::{BusError, TransferFault};

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    /// Slave to master.
    Read,
    /// Master to slave.
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Status of a master's current (or last) transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BusStatus {
    /// Idle, or the last transaction completed.
    #[default]
    Ok,
    /// The last transaction failed.
    Error,
    /// Submitted, not yet picked by the arbiter.
    Request,
    /// At least one unit dispatched; the transaction is still running.
    Wait,
}

impl BusStatus {
    /// Returns `true` for `Ok` and `Error`, the states that accept a new submission.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ok | Self::Error)
    }

    /// Returns `true` for `Request` and `Wait`, the states the arbiter considers.
    pub const fn is_runnable(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "SIMPLE_BUS_OK",
            Self::Error => "SIMPLE_BUS_ERROR",
            Self::Request => "SIMPLE_BUS_REQUEST",
            Self::Wait => "SIMPLE_BUS_WAIT",
        };
        f.write_str(s)
    }
}

/// Lock state of a request, independent of its transfer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LockState {
    /// No lock requested.
    #[default]
    None,
    /// Lock requested, not (or no longer) granted.
    Set,
    /// Lock granted by the arbiter, or re-asserted while set.
    Granted,
}

impl LockState {
    /// Transition applied when a master submits with its lock flag raised.
    pub const fn assert(self) -> Self {
        match self {
            Self::Set => Self::Granted,
            Self::None | Self::Granted => Self::Set,
        }
    }

    /// Transition applied when the arbiter picks the request by priority.
    pub const fn grant(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Set | Self::Granted => Self::Granted,
        }
    }

    /// Transition applied at an idle moment of the bus.
    ///
    /// A granted lock falls back to `Set`. A `Set` lock survives only while
    /// `mid_burst` (its burst is still being transferred); otherwise it is dropped.
    pub const fn decay(self, mid_burst: bool) -> Self {
        match self {
            Self::Granted => Self::Set,
            Self::Set if mid_burst => Self::Set,
            Self::Set | Self::None => Self::None,
        }
    }

    /// One-character tag used in arbitration traces.
    pub const fn tag(self) -> char {
        match self {
            Self::None => '-',
            Self::Set => '=',
            Self::Granted => '+',
        }
    }
}

/// Handle into the registry; stable for the lifetime of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) usize);

impl RequestId {
    /// Returns the registry slot index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One master's request record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    priority: u32,
    pub(crate) status: BusStatus,
    operation: Operation,
    pub(crate) address: u64,
    end_address: u64,
    length: usize,
    pub(crate) buffer: Vec<u32>,
    pub(crate) slot: usize,
    pub(crate) lock: LockState,
    pub(crate) fault: Option<TransferFault>,
}

impl Request {
    /// Creates an idle record for `priority`.
    pub const fn new(priority: u32) -> Self {
        Self {
            priority,
            status: BusStatus::Ok,
            operation: Operation::Read,
            address: 0,
            end_address: 0,
            length: 0,
            buffer: Vec::new(),
            slot: 0,
            lock: LockState::None,
            fault: None,
        }
    }

    /// Creates a record with an explicit status and lock state.
    ///
    /// Arbiters only look at priority, status, lock and cursor, so this is
    /// enough to exercise a custom [`Arbiter`](super::arbiter::Arbiter) in isolation.
    pub const fn in_state(priority: u32, status: BusStatus, lock: LockState, address: u64) -> Self {
        let mut request = Self::new(priority);
        request.status = status;
        request.lock = lock;
        request.address = address;
        request.end_address = address;
        request.length = 1;
        request
    }

    /// Unique priority of the owning master; lower wins arbitration.
    pub const fn priority(&self) -> u32 {
        self.priority
    }
    /// Current transaction status.
    pub const fn status(&self) -> BusStatus {
        self.status
    }
    /// Direction of the current transaction.
    pub const fn operation(&self) -> Operation {
        self.operation
    }
    /// Address of the next word to transfer.
    ///
    /// Once the transaction is exhausted it points one word past the end,
    /// saturating at the top of the address space.
    pub const fn cursor_address(&self) -> u64 {
        self.address
    }
    /// Address of the last word of the transaction.
    pub const fn end_address(&self) -> u64 {
        self.end_address
    }
    /// Current lock state.
    pub const fn lock_state(&self) -> LockState {
        self.lock
    }
    /// Fault recorded when the last transaction ended in `Error`.
    pub const fn fault(&self) -> Option<TransferFault> {
        self.fault
    }
    /// Data buffer of the current transaction.
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }
    /// Index of the buffer word paired with the cursor address.
    pub const fn buffer_slot(&self) -> usize {
        self.slot
    }
    /// Number of words transferred so far in this transaction.
    pub const fn words_done(&self) -> usize {
        self.slot
    }

    /// Number of words in the transaction.
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns `true` if every word of the transaction has been transferred.
    pub const fn is_exhausted(&self) -> bool {
        self.slot >= self.length
    }

    /// Moves the cursor to the next word after a successful unit.
    pub(crate) const fn advance(&mut self) {
        self.address = self.address.saturating_add(WORD_BYTES);
        self.slot += 1;
    }

    /// Word the cursor currently points at; `0` if the buffer is exhausted.
    pub(crate) fn current_word(&self) -> u32 {
        self.buffer.get(self.slot).copied().unwrap_or(0)
    }

    pub(crate) fn current_word_mut(&mut self) -> Option<&mut u32> {
        self.buffer.get_mut(self.slot)
    }
}

/// One submission to the bus.
///
/// `buffer` must hold at least `length` words: reads land in it, writes are
/// taken from it, one word per transferred unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Unique priority of the submitting master.
    pub priority: u32,
    /// Direction of the transfer.
    pub operation: Operation,
    /// Byte address of the first word.
    pub address: u64,
    /// Number of words; `1` for a single transfer.
    pub length: usize,
    /// Whether the master asserts its bus lock for this transfer.
    pub lock: bool,
    /// Caller-supplied data words.
    pub buffer: Vec<u32>,
}

impl Transfer {
    /// Single-word read with an empty destination word.
    pub fn read(priority: u32, address: u64) -> Self {
        Self::burst_read(priority, address, 1)
    }

    /// Multi-word read into a zeroed buffer of `length` words.
    pub fn burst_read(priority: u32, address: u64, length: usize) -> Self {
        Self {
            priority,
            operation: Operation::Read,
            address,
            length,
            lock: false,
            buffer: vec![0; length],
        }
    }

    /// Single-word write of `value`.
    pub fn write(priority: u32, address: u64, value: u32) -> Self {
        Self::burst_write(priority, address, vec![value])
    }

    /// Multi-word write of every word in `data`.
    pub fn burst_write(priority: u32, address: u64, data: Vec<u32>) -> Self {
        Self {
            priority,
            operation: Operation::Write,
            address,
            length: data.len(),
            lock: false,
            buffer: data,
        }
    }

    /// Raises the lock flag.
    #[must_use]
    pub const fn locked(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }
}

/// Registry of request records, one per priority, in creation order.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    requests: Vec<Request>,
}

impl RequestRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    /// Returns the handle of the record for `priority`, creating it on first use.
    pub fn get_or_create(&mut self, priority: u32) -> RequestId {
        if let Some(id) = self.find(priority) {
            return id;
        }
        self.requests.push(Request::new(priority));
        RequestId(self.requests.len() - 1)
    }

    /// Returns the handle of the record for `priority`, if one exists.
    pub fn find(&self, priority: u32) -> Option<RequestId> {
        self.requests
            .iter()
            .position(|r| r.priority == priority)
            .map(RequestId)
    }

    /// Starts a new transaction on the record of `transfer.priority`.
    ///
    /// The buffer is owned by the record until the master takes it back with
    /// [`RequestRegistry::take_buffer`].
    ///
    /// # Errors
    ///
    /// * `BusError::ReentrantSubmit` if the previous transaction of this master is
    ///   still `Request` or `Wait`.
    /// * `BusError::ZeroLengthTransfer` if `transfer.length == 0`.
    /// * `BusError::BufferTooShort` if the buffer holds fewer than `length` words.
    /// * `BusError::AddressOverflow` if the last word would lie past `u64::MAX`.
    pub fn submit(&mut self, transfer: Transfer) -> Result<RequestId, BusError> {
        let Transfer {
            priority,
            operation,
            address,
            length,
            lock,
            buffer,
        } = transfer;

        if length == 0 {
            return Err(BusError::ZeroLengthTransfer { priority });
        }
        if buffer.len() < length {
            return Err(BusError::BufferTooShort {
                priority,
                length,
                buffer: buffer.len(),
            });
        }
        let end_address =
            burst_end_address(address, length).ok_or(BusError::AddressOverflow {
                priority,
                address,
                length,
            })?;

        let id = self.get_or_create(priority);
        let request = &mut self.requests[id.0];
        if !request.status.is_terminal() {
            return Err(BusError::ReentrantSubmit {
                priority,
                status: request.status,
            });
        }

        request.operation = operation;
        request.address = address;
        request.end_address = end_address;
        request.length = length;
        request.buffer = buffer;
        request.slot = 0;
        request.fault = None;
        if lock {
            request.lock = request.lock.assert();
        }
        request.status = BusStatus::Request;
        Ok(id)
    }

    /// Returns the status of `priority`; an unknown master reads as idle (`Ok`).
    pub fn poll(&self, priority: u32) -> BusStatus {
        self.find(priority)
            .map_or(BusStatus::Ok, |id| self.requests[id.0].status)
    }

    /// Hands the buffer of a terminal transaction back to its master.
    ///
    /// Returns `None` if the master is unknown or its transaction is still running.
    pub fn take_buffer(&mut self, priority: u32) -> Option<Vec<u32>> {
        let id = self.find(priority)?;
        let request = &mut self.requests[id.0];
        if !request.status.is_terminal() {
            return None;
        }
        Some(std::mem::take(&mut request.buffer))
    }

    /// Handles of every record whose status is `Request` or `Wait`, in creation order.
    pub fn runnable(&self) -> Vec<RequestId> {
        self.requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status.is_runnable())
            .map(|(i, _)| RequestId(i))
            .collect()
    }

    /// Applies the idle-moment lock transition to every record.
    pub fn decay_locks(&mut self) {
        for request in &mut self.requests {
            let mid_burst = request.status == BusStatus::Wait;
            request.lock = request.lock.decay(mid_burst);
        }
    }

    /// Returns the record behind `id`.
    pub fn get(&self, id: RequestId) -> &Request {
        &self.requests[id.0]
    }

    /// Returns the record behind `id` mutably.
    pub fn get_mut(&mut self, id: RequestId) -> &mut Request {
        &mut self.requests[id.0]
    }

    /// Returns the record for `priority`, if one exists.
    pub fn by_priority(&self, priority: u32) -> Option<&Request> {
        self.find(priority).map(|id| &self.requests[id.0])
    }

    /// Number of distinct masters seen so far.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` if no master has submitted yet.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Iterates over every record in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter()
    }
}
