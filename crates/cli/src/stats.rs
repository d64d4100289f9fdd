//! Bus statistics collection and reporting.
//!
//! This module counts what the bus reports through its observer hooks:
//! 1. **Traffic:** Completed words by direction and bytes transferred.
//! 2. **Utilization:** Busy ticks against total ticks.
//! 3. **Arbitration:** Decisions per rule, grants per master, rejected candidates.
//! 4. **Errors:** Failed transactions and failed direct accesses.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use simbus_core::bus::observer::{
    ArbitrationEvent, BusObserver, CompletionEvent, DirectEvent, UnitEvent, UnitOutcome,
};
use simbus_core::bus::{ArbitrationRule, BusStatus, Operation};
use simbus_core::common::WORD_BYTES;

/// Counters collected over one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Ticks observed.
    pub ticks: u64,
    /// Ticks in which a unit was dispatched.
    pub busy_ticks: u64,
    /// Words read successfully.
    pub words_read: u64,
    /// Words written successfully.
    pub words_written: u64,
    /// Dispatches answered with a wait state.
    pub wait_units: u64,
    /// Arbitration decisions taken.
    pub arbitrations: u64,
    /// Decisions per rule number.
    pub by_rule: BTreeMap<u8, u64>,
    /// Grants per master priority.
    pub grants: BTreeMap<u32, u64>,
    /// Candidates that lost an arbitration round.
    pub rejected: u64,
    /// Transactions completed with `Ok`.
    pub completed: u64,
    /// Transactions completed with `Error`.
    pub errors: u64,
    /// Direct accesses performed.
    pub direct_accesses: u64,
    /// Direct accesses that failed.
    pub direct_failures: u64,
}

impl BusStats {
    /// Bytes moved over the bus by arbitrated transfers.
    pub const fn bytes_transferred(&self) -> u64 {
        (self.words_read + self.words_written) * WORD_BYTES
    }

    /// Fraction of ticks in which the bus was busy.
    pub fn utilization(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.busy_ticks as f64 / self.ticks as f64
        }
    }

    /// Prints the text report.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("SHARED BUS STATISTICS");
        println!("==========================================================");
        println!("sim_ticks                {}", self.ticks);
        println!("bus_busy_ticks           {}", self.busy_ticks);
        println!("bus_utilization          {:.2}%", self.utilization() * 100.0);
        println!("----------------------------------------------------------");
        println!("TRAFFIC");
        println!("  words_read             {}", self.words_read);
        println!("  words_written          {}", self.words_written);
        println!("  bytes                  {}", self.bytes_transferred());
        println!("  wait_units             {}", self.wait_units);
        println!("  completed              {}", self.completed);
        println!("  errors                 {}", self.errors);
        println!("----------------------------------------------------------");
        println!("ARBITRATION");
        println!("  decisions              {}", self.arbitrations);
        for (rule, count) in &self.by_rule {
            println!("  rule_{rule}                 {count}");
        }
        println!("  rejected               {}", self.rejected);
        for (priority, count) in &self.grants {
            println!("  grants.prio_{priority:<10} {count}");
        }
        println!("----------------------------------------------------------");
        println!("DIRECT");
        println!("  accesses               {}", self.direct_accesses);
        println!("  failures               {}", self.direct_failures);
        println!("==========================================================");
    }

    fn record_unit(&mut self, event: &UnitEvent) {
        match (event.outcome, event.operation) {
            (UnitOutcome::Done, Operation::Read) => self.words_read += 1,
            (UnitOutcome::Done, Operation::Write) => self.words_written += 1,
            (UnitOutcome::Wait, _) => self.wait_units += 1,
            (UnitOutcome::Fault(_), _) => {}
        }
    }

    fn record_arbitration(&mut self, rule: ArbitrationRule, winner: u32, rejected: usize) {
        self.arbitrations += 1;
        *self.by_rule.entry(rule.number()).or_default() += 1;
        *self.grants.entry(winner).or_default() += 1;
        self.rejected += rejected as u64;
    }
}

/// Observer feeding a shared [`BusStats`].
///
/// The bus owns the observer, so the counters live behind an `Arc<Mutex<_>>`
/// that the driver keeps a handle to.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    stats: Arc<Mutex<BusStats>>,
}

impl StatsCollector {
    /// Creates a collector with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the counters collected so far.
    pub fn snapshot(&self) -> BusStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut BusStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *stats);
    }
}

impl BusObserver for StatsCollector {
    fn on_arbitration(&mut self, event: &ArbitrationEvent) {
        self.update(|s| s.record_arbitration(event.rule, event.winner, event.rejected));
    }

    fn on_unit(&mut self, event: &UnitEvent) {
        self.update(|s| s.record_unit(event));
    }

    fn on_complete(&mut self, event: &CompletionEvent) {
        self.update(|s| match event.status {
            BusStatus::Error => s.errors += 1,
            _ => s.completed += 1,
        });
    }

    fn on_direct(&mut self, event: &DirectEvent) {
        self.update(|s| {
            s.direct_accesses += 1;
            if !event.ok {
                s.direct_failures += 1;
            }
        });
    }

    fn on_tick(&mut self, _tick: u64, busy: bool) {
        self.update(|s| {
            s.ticks += 1;
            if busy {
                s.busy_ticks += 1;
            }
        });
    }
}
