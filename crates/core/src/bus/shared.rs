//! Thread-safe handle to a bus.
//!
//! Masters running on their own threads submit and poll through a cloned
//! `SharedBus` while one driver thread calls `tick`. Every operation takes the
//! mutex exactly once, so a tick and a submission never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use super::request::{BusStatus, Transfer};
use super::observer::UnitEvent;
use super::scheduler::Bus;
use crate::common::BusError;

/// Cloneable, mutex-guarded bus handle.
#[derive(Debug, Clone)]
pub struct SharedBus {
    inner: Arc<Mutex<Bus>>,
}

impl SharedBus {
    /// Wraps `bus` for shared use.
    pub fn new(bus: Bus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Bus>, BusError> {
        self.inner.lock().map_err(|_| BusError::LockPoisoned)
    }

    /// Submits a transaction; see [`Bus::submit`].
    ///
    /// # Errors
    ///
    /// `BusError::LockPoisoned`, or any submission error of [`Bus::submit`].
    pub fn submit(&self, transfer: Transfer) -> Result<(), BusError> {
        self.lock()?.submit(transfer)
    }

    /// Polls the status of `priority`.
    ///
    /// # Errors
    ///
    /// `BusError::LockPoisoned` if a holder of the lock panicked.
    pub fn poll(&self, priority: u32) -> Result<BusStatus, BusError> {
        Ok(self.lock()?.poll(priority))
    }

    /// Takes back the buffer of a finished transaction.
    ///
    /// # Errors
    ///
    /// `BusError::LockPoisoned` if a holder of the lock panicked.
    pub fn take_buffer(&self, priority: u32) -> Result<Option<Vec<u32>>, BusError> {
        Ok(self.lock()?.take_buffer(priority))
    }

    /// Runs one bus tick inside the critical section.
    ///
    /// # Errors
    ///
    /// `BusError::LockPoisoned`, or any error of [`Bus::tick`].
    pub fn tick(&self) -> Result<Option<UnitEvent>, BusError> {
        self.lock()?.tick()
    }

    /// Runs `f` with exclusive access to the bus.
    ///
    /// # Errors
    ///
    /// `BusError::LockPoisoned` if a holder of the lock panicked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bus) -> R) -> Result<R, BusError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Unwraps the bus if this is the last handle.
    ///
    /// Returns `Err(self)` if other handles are still alive.
    pub fn into_inner(self) -> Result<Bus, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .map_err(|poisoned| Self::new(poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}
