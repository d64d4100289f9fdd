//! Shared-bus simulation library.
//!
//! This crate models a single bus shared by several masters and slaves:
//! 1. **Bus:** Request registry, three-rule arbitration with locking, and the
//!    per-tick scheduler moving one word per tick.
//! 2. **Slaves:** The `Slave` trait, the address directory, and memory devices
//!    with optional wait states.
//! 3. **Masters:** Blocking, non-blocking and direct master models.
//! 4. **Simulation:** Configuration loading and the clocked simulator.

/// Common types and constants (word size, errors, faults).
pub mod common;
/// Simulation configuration (defaults, slave map, master models).
pub mod config;
/// Bus core (directory, requests, arbitration, scheduler, observer).
pub mod bus;
/// Slave devices.
pub mod devices;
/// Master models, system builder and the simulation driver.
pub mod sim;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// The shared bus; construct with `Bus::new` or `sim::build_bus`.
pub use crate::bus::Bus;
/// Clocked driver stepping masters and the bus.
pub use crate::sim::Simulator;
