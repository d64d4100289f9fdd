//! Builds buses and master models from a [`Config`].

use crate::bus::{Bus, SlaveDirectory};
use crate::common::BusError;
use crate::config::{Config, MasterConfig};
use crate::devices::Memory;

use super::master::{BlockingMaster, DirectMaster, Master, NonBlockingMaster};

/// Creates a bus with one [`Memory`] per configured slave.
///
/// # Errors
///
/// `BusError::InvalidSlaveRange` for a malformed range,
/// `BusError::OverlappingSlaveRanges` if two slaves overlap.
pub fn build_bus(config: &Config) -> Result<Bus, BusError> {
    let mut directory = SlaveDirectory::new();
    for slave in &config.slaves {
        let memory = Memory::new(slave.name.clone(), slave.start, slave.end, slave.wait_states)?;
        directory.register(Box::new(memory))?;
    }
    Ok(Bus::new(directory))
}

/// Instantiates the configured master models, in configuration order.
pub fn build_masters(config: &Config) -> Vec<Box<dyn Master>> {
    config
        .masters
        .iter()
        .map(|master| -> Box<dyn Master> {
            match master {
                MasterConfig::Blocking {
                    name,
                    priority,
                    address,
                    lock,
                    timeout,
                    burst_length,
                } => Box::new(BlockingMaster::new(
                    name.clone(),
                    *priority,
                    *address,
                    *burst_length,
                    *lock,
                    *timeout,
                )),
                MasterConfig::NonBlocking {
                    name,
                    priority,
                    start_address,
                    lock,
                    timeout,
                } => Box::new(NonBlockingMaster::new(
                    name.clone(),
                    *priority,
                    *start_address,
                    *lock,
                    *timeout,
                )),
                MasterConfig::Direct {
                    name,
                    address,
                    timeout,
                } => Box::new(DirectMaster::new(name.clone(), *address, *timeout)),
            }
        })
        .collect()
}
