//! Bus core.
//!
//! This module organizes the pieces of the shared bus, leaves first:
//! 1. **Slaves:** the `Slave` trait and the `SlaveDirectory` routing addresses to them.
//! 2. **Requests:** one record per master priority, kept by the `RequestRegistry`.
//! 3. **Arbitration:** the three-rule `PriorityArbiter`.
//! 4. **Scheduling:** the `Bus` driving one transfer unit per tick.
//! 5. **Observation:** event hooks for external metrics collectors.

/// Three-rule arbitration.
pub mod arbiter;

/// Address-to-slave routing with overlap checking.
pub mod directory;

/// Event hooks reported by the scheduler.
pub mod observer;

/// Request records, lock states and the request registry.
pub mod request;

/// Per-tick scheduler and master/direct interfaces.
pub mod scheduler;

/// Mutex-guarded bus handle for threaded masters.
pub mod shared;

/// Slave trait.
pub mod traits;

pub use arbiter::{ArbitrationRule, Arbiter, Grant, PriorityArbiter};
pub use directory::SlaveDirectory;
pub use observer::{BusObserver, NullObserver, UnitEvent, UnitOutcome};
pub use request::{BusStatus, LockState, Operation, Request, RequestRegistry, Transfer};
pub use scheduler::Bus;
pub use shared::SharedBus;
pub use traits::{Slave, SlaveStatus};
