//! Observation hooks for metrics and tracing collectors.
//!
//! The scheduler reports what it does through a [`BusObserver`]. Observers are
//! write-only from the bus' point of view: nothing they do feeds back into
//! arbitration or transfer order. Every hook has a no-op default so a collector
//! only implements the events it cares about.

use serde::Serialize;

use super::arbiter::ArbitrationRule;
use super::request::{BusStatus, Operation};
use crate::common::TransferFault;

/// A master started a new transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitEvent {
    /// Bus cycle of the submission.
    pub tick: u64,
    /// Priority of the submitting master.
    pub priority: u32,
    /// Direction of the transfer.
    pub operation: Operation,
    /// First word address.
    pub address: u64,
    /// Transfer length in words.
    pub length: usize,
    /// Whether the lock flag was raised.
    pub lock: bool,
}

/// The arbiter picked a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArbitrationEvent {
    /// Bus cycle of the decision.
    pub tick: u64,
    /// Priority of the winner.
    pub winner: u32,
    /// Rule that selected the winner.
    pub rule: ArbitrationRule,
    /// Number of candidates that lost.
    pub rejected: usize,
}

/// How a single dispatched unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitOutcome {
    /// The word was transferred.
    Done,
    /// The slave asked for more ticks; the unit will be re-dispatched.
    Wait,
    /// The unit failed and the request ended in `Error`.
    Fault(TransferFault),
}

/// One transfer unit was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitEvent {
    /// Bus cycle of the unit.
    pub tick: u64,
    /// Priority of the request served.
    pub priority: u32,
    /// Direction of the transfer.
    pub operation: Operation,
    /// Word address of the unit.
    pub address: u64,
    /// Result of the unit.
    pub outcome: UnitOutcome,
}

/// A transaction reached a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    /// Bus cycle of completion.
    pub tick: u64,
    /// Priority of the finished request.
    pub priority: u32,
    /// `Ok` or `Error`.
    pub status: BusStatus,
    /// Words transferred successfully.
    pub words: usize,
}

/// A direct (arbitration-free) access was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectEvent {
    /// Bus cycle of the access.
    pub tick: u64,
    /// Direction of the access.
    pub operation: Operation,
    /// Word address.
    pub address: u64,
    /// Whether the access succeeded.
    pub ok: bool,
}

/// Collector of bus events.
pub trait BusObserver: Send {
    /// Called after a successful submission.
    fn on_submit(&mut self, _event: &SubmitEvent) {}
    /// Called after each arbitration decision.
    fn on_arbitration(&mut self, _event: &ArbitrationEvent) {}
    /// Called after each dispatched unit, including waits and faults.
    fn on_unit(&mut self, _event: &UnitEvent) {}
    /// Called when a transaction turns `Ok` or `Error`.
    fn on_complete(&mut self, _event: &CompletionEvent) {}
    /// Called after each direct access.
    fn on_direct(&mut self, _event: &DirectEvent) {}
    /// Called at the end of every tick; `busy` is `true` if a unit was dispatched.
    fn on_tick(&mut self, _tick: u64, _busy: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BusObserver for NullObserver {}
