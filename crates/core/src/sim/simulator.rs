//! Clocked simulation driver.
//!
//! A cycle of the [`Simulator`] has two phases:
//! 1. **Masters:** every master is stepped in attachment order and may submit,
//!    poll or access slaves directly.
//! 2. **Bus:** the bus performs one tick (arbitration plus one transfer unit).

use tracing::{debug, info};

use crate::bus::{Bus, BusStatus, UnitEvent};
use crate::common::SimError;
use crate::config::Config;

use super::builder::{build_bus, build_masters};
use super::master::Master;

/// Bus plus the masters driving it.
pub struct Simulator {
    /// The simulated bus.
    pub bus: Bus,
    masters: Vec<Box<dyn Master>>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.masters.iter().map(|m| m.name()).collect();
        f.debug_struct("Simulator")
            .field("bus", &self.bus)
            .field("masters", &names)
            .finish()
    }
}

impl Simulator {
    /// Creates a simulator with no masters.
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            masters: Vec::new(),
        }
    }

    /// Builds the bus and masters described by `config`.
    ///
    /// # Errors
    ///
    /// `SimError::Bus` if the slave map is invalid.
    pub fn from_config(config: &Config) -> Result<Self, SimError> {
        let bus = build_bus(config)?;
        let mut sim = Self::new(bus);
        for master in build_masters(config) {
            sim.add_master(master);
        }
        info!(
            slaves = sim.bus.directory().len(),
            masters = sim.masters.len(),
            "simulator ready"
        );
        Ok(sim)
    }

    /// Attaches a master; masters are stepped in attachment order.
    pub fn add_master(&mut self, master: Box<dyn Master>) {
        self.masters.push(master);
    }

    /// Number of attached masters.
    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    /// Number of cycles executed so far.
    pub const fn cycle(&self) -> u64 {
        self.bus.cycle()
    }

    /// Runs one cycle: all masters, then one bus tick.
    ///
    /// # Errors
    ///
    /// `SimError::Bus` on the first contract violation.
    pub fn tick(&mut self) -> Result<Option<UnitEvent>, SimError> {
        let cycle = self.bus.cycle();
        for master in &mut self.masters {
            master.tick(&mut self.bus, cycle)?;
        }
        Ok(self.bus.tick()?)
    }

    /// Runs `ticks` cycles.
    ///
    /// # Errors
    ///
    /// Stops at the first contract violation.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            let _ = self.tick()?;
        }
        debug!(cycle = self.cycle(), "run finished");
        Ok(())
    }

    /// Ticks until the transaction of `priority` reaches a terminal status.
    ///
    /// This is the blocking form of a submission: the call returns once the tick
    /// that finished the transaction has completed.
    ///
    /// # Arguments
    ///
    /// * `priority` - Master whose transaction is awaited.
    /// * `max_ticks` - Upper bound on the ticks spent waiting.
    ///
    /// # Returns
    ///
    /// The terminal status, `Ok` or `Error`.
    ///
    /// # Errors
    ///
    /// `SimError::Timeout` if the status is still running after `max_ticks`,
    /// `SimError::Bus` on a contract violation.
    pub fn run_until_terminal(&mut self, priority: u32, max_ticks: u64) -> Result<BusStatus, SimError> {
        for _ in 0..max_ticks {
            let status = self.bus.poll(priority);
            if status.is_terminal() {
                return Ok(status);
            }
            let _ = self.tick()?;
        }
        let status = self.bus.poll(priority);
        if status.is_terminal() {
            Ok(status)
        } else {
            Err(SimError::Timeout {
                priority,
                ticks: max_ticks,
            })
        }
    }
}
