//! Simulation layer.
//!
//! Everything needed to run a complete system:
//! 1. **Masters:** traffic generators stepped once per cycle.
//! 2. **Builder:** bus and masters built from a `Config`.
//! 3. **Simulator:** the clock tying masters and bus together.

/// Bus and master construction from a configuration.
pub mod builder;

/// Master models.
pub mod master;

/// Clocked simulation driver.
pub mod simulator;

pub use builder::{build_bus, build_masters};
pub use master::{BlockingMaster, DirectMaster, Master, NonBlockingMaster};
pub use simulator::Simulator;
