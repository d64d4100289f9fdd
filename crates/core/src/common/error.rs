//! Error definitions for the bus model.
//!
//! Two families of failure exist:
//! 1. **Contract violations** ([`BusError`]): caller bugs that invalidate the
//!    scheduling guarantees. They are returned as `Err` and end the run.
//! 2. **Transfer faults** ([`TransferFault`]): request-level failures. They
//!    mark the one request `Error` and never stop the scheduler.

use serde::Serialize;
use thiserror::Error;

use crate::bus::request::BusStatus;

/// Fatal contract violation raised by setup, submission, or a scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Two simultaneously runnable requests carry the same priority value.
    #[error("duplicate priority {priority} among runnable requests")]
    DuplicatePendingPriority {
        /// The priority value seen twice.
        priority: u32,
    },

    /// A slave range intersects a range registered earlier.
    #[error(
        "overlapping address spaces: {new_name} [{new_start:#x}..={new_end:#x}] \
         intersects {existing_name} [{existing_start:#x}..={existing_end:#x}]"
    )]
    OverlappingSlaveRanges {
        /// Name of the slave being registered.
        new_name: String,
        /// First byte address of the new slave.
        new_start: u64,
        /// Last byte address of the new slave.
        new_end: u64,
        /// Name of the slave already holding part of the range.
        existing_name: String,
        /// First byte address of the existing slave.
        existing_start: u64,
        /// Last byte address of the existing slave.
        existing_end: u64,
    },

    /// A slave range is empty or its bounds are not word aligned.
    #[error("invalid address range for {name}: [{start:#x}..={end:#x}]")]
    InvalidSlaveRange {
        /// Name of the offending slave.
        name: String,
        /// First byte address.
        start: u64,
        /// Last byte address.
        end: u64,
    },

    /// A master submitted while its previous transaction was still active.
    #[error("priority {priority} submitted while its previous transfer is {status}")]
    ReentrantSubmit {
        /// Priority of the submitting master.
        priority: u32,
        /// Status of the unfinished transaction.
        status: BusStatus,
    },

    /// A transfer was submitted with a length of zero words.
    #[error("priority {priority} submitted a zero-length transfer")]
    ZeroLengthTransfer {
        /// Priority of the submitting master.
        priority: u32,
    },

    /// The last word of a transfer would lie past the top of the address space.
    #[error("priority {priority} submitted {length} words at {address:#x}, past the end of the address space")]
    AddressOverflow {
        /// Priority of the submitting master.
        priority: u32,
        /// Start address of the transfer.
        address: u64,
        /// Requested transfer length in words.
        length: usize,
    },

    /// The buffer handed to `submit` holds fewer words than the transfer moves.
    #[error("priority {priority} submitted a {length}-word transfer with a {buffer}-word buffer")]
    BufferTooShort {
        /// Priority of the submitting master.
        priority: u32,
        /// Requested transfer length in words.
        length: usize,
        /// Words available in the buffer.
        buffer: usize,
    },

    /// The arbiter granted a priority that is not registered.
    #[error("arbiter granted unknown priority {priority}")]
    UnknownGrant {
        /// Priority named by the grant.
        priority: u32,
    },

    /// The mutex guarding a shared bus was poisoned by a panicking holder.
    #[error("shared bus lock poisoned")]
    LockPoisoned,
}

/// Request-level failure; recorded on the request alongside `BusStatus::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum TransferFault {
    /// The cursor address is not a multiple of the word size.
    #[error("address {0:#06x} not word aligned")]
    MisalignedAddress(u64),
    /// No registered slave owns the cursor address.
    #[error("no slave for address {0:#06x}")]
    UnmappedAddress(u64),
    /// The addressed slave reported an error for the unit.
    #[error("slave error at address {0:#06x}")]
    SlaveError(u64),
}

impl TransferFault {
    /// Returns the address at which the fault occurred.
    pub const fn address(&self) -> u64 {
        match *self {
            Self::MisalignedAddress(addr) | Self::UnmappedAddress(addr) | Self::SlaveError(addr) => {
                addr
            }
        }
    }
}

/// Failure to load or validate a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid JSON for `Config`.
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration is well-formed but inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// A bus contract violation ended the run.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A transaction did not reach a terminal status in time.
    #[error("priority {priority} still running after {ticks} ticks")]
    Timeout {
        /// Priority being waited for.
        priority: u32,
        /// Ticks spent waiting.
        ticks: u64,
    },
}
