//! Common types shared by every part of the bus model.
//!
//! This module provides the building blocks used across the crate. It includes:
//! 1. **Constants:** Word size and alignment helpers for the 32-bit data path.
//! 2. **Error Handling:** Fatal contract violations and recoverable transfer faults.

/// Word size and address alignment constants.
pub mod constants;

/// Error types for contract violations and request-level faults.
pub mod error;

pub use constants::{WORD_BYTES, is_word_aligned};
pub use error::{BusError, ConfigError, SimError, TransferFault};
