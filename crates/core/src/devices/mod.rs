//! Slave devices attachable to the bus.
//!
//! Currently a single configurable memory model, used both as the zero-wait
//! "fast" memory and as the wait-state "slow" memory of the default system.

/// Word-addressed memory with configurable wait states.
pub mod memory;

pub use memory::Memory;
