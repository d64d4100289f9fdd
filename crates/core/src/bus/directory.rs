//! Slave directory: address-to-slave routing.
//!
//! Slaves are registered once at setup. Registration rejects a range that
//! intersects any range registered before it, so every address resolves to at
//! most one slave. Lookup is a linear scan over the registration order.

use tracing::info;

use super::traits::Slave;
use crate::common::BusError;
use crate::common::constants::is_word_aligned;

/// Ordered set of slaves with pairwise disjoint address ranges.
#[derive(Default)]
pub struct SlaveDirectory {
    slaves: Vec<Box<dyn Slave>>,
}

impl std::fmt::Debug for SlaveDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for slave in &self.slaves {
            let _ = list.entry(&format_args!(
                "{} [{:#x}..={:#x}]",
                slave.name(),
                slave.start_address(),
                slave.end_address()
            ));
        }
        list.finish()
    }
}

impl SlaveDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self { slaves: Vec::new() }
    }

    /// Registers a slave.
    ///
    /// # Errors
    ///
    /// * `BusError::InvalidSlaveRange` if the range is empty or its bounds do not
    ///   cover whole words.
    /// * `BusError::OverlappingSlaveRanges` if the range intersects a slave
    ///   registered earlier. Overlap is checked before word alignment.
    pub fn register(&mut self, slave: Box<dyn Slave>) -> Result<(), BusError> {
        let (start, end) = (slave.start_address(), slave.end_address());
        if start > end {
            return Err(Self::invalid(slave.as_ref()));
        }

        if let Some(existing) = self
            .slaves
            .iter()
            .find(|s| !(end < s.start_address() || start > s.end_address()))
        {
            return Err(BusError::OverlappingSlaveRanges {
                new_name: slave.name().to_owned(),
                new_start: start,
                new_end: end,
                existing_name: existing.name().to_owned(),
                existing_start: existing.start_address(),
                existing_end: existing.end_address(),
            });
        }

        if !is_word_aligned(start) || !is_word_aligned(end.wrapping_add(1)) {
            return Err(Self::invalid(slave.as_ref()));
        }

        info!(slave = slave.name(), start, end, "registered slave");
        self.slaves.push(slave);
        Ok(())
    }

    fn invalid(slave: &dyn Slave) -> BusError {
        BusError::InvalidSlaveRange {
            name: slave.name().to_owned(),
            start: slave.start_address(),
            end: slave.end_address(),
        }
    }

    /// Returns the slave owning `address`, or `None` if the address is unmapped.
    pub fn resolve(&mut self, address: u64) -> Option<&mut dyn Slave> {
        for slave in &mut self.slaves {
            if slave.contains(address) {
                return Some(&mut **slave);
            }
        }
        None
    }

    /// Returns the number of registered slaves.
    pub fn len(&self) -> usize {
        self.slaves.len()
    }

    /// Returns `true` if no slave is registered.
    pub fn is_empty(&self) -> bool {
        self.slaves.is_empty()
    }

    /// Iterates over the registered slaves in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Slave> {
        self.slaves.iter().map(|s| &**s as &dyn Slave)
    }
}
