//! Configuration for a simulated bus system.
//!
//! This module defines the structures used to describe a system. It provides:
//! 1. **Defaults:** The reference test bench (two memories, three masters).
//! 2. **Structures:** Bus run length, slave address map, and master models.
//! 3. **Loading:** JSON deserialization from text or file, plus validation.
//!
//! Every field has a default, so `{}` is a valid configuration describing the
//! default system.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::common::ConfigError;
use crate::common::constants::BURST_WORDS;

/// Default configuration constants.
mod defaults {
    /// Zero-wait memory at the bottom of the address map.
    pub const FAST_MEM_START: u64 = 0x00;
    /// Last byte of the fast memory.
    pub const FAST_MEM_END: u64 = 0x7F;

    /// Wait-state memory directly above the fast memory.
    pub const SLOW_MEM_START: u64 = 0x80;
    /// Last byte of the slow memory.
    pub const SLOW_MEM_END: u64 = 0xFF;
    /// Wait states inserted by the slow memory per word.
    pub const SLOW_MEM_WAIT_STATES: u32 = 1;

    /// Blocking master priority.
    pub const BLOCKING_PRIORITY: u32 = 4;
    /// Start of the blocking master's burst; straddles both memories.
    pub const BLOCKING_ADDRESS: u64 = 0x4C;
    /// Idle ticks between two bursts of the blocking master.
    pub const BLOCKING_TIMEOUT: u64 = 300;

    /// Non-blocking master priority (wins against the blocking master).
    pub const NON_BLOCKING_PRIORITY: u32 = 3;
    /// First word touched by the non-blocking master.
    pub const NON_BLOCKING_ADDRESS: u64 = 0x38;
    /// Idle ticks between two read-modify-write rounds.
    pub const NON_BLOCKING_TIMEOUT: u64 = 20;

    /// First word dumped by the direct master.
    pub const DIRECT_ADDRESS: u64 = 0x78;
    /// Ticks between two direct dumps.
    pub const DIRECT_TIMEOUT: u64 = 100;

    /// Default simulation length in ticks.
    pub const MAX_TICKS: u64 = 10_000;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use simbus_core::config::{Config, MasterConfig};
///
/// let json = r#"{
///     "bus": { "max_ticks": 500 },
///     "slaves": [
///         { "name": "rom", "start": 0, "end": 255 },
///         { "name": "ram", "start": 256, "end": 511, "wait_states": 2 }
///     ],
///     "masters": [
///         { "kind": "non_blocking", "name": "cpu", "priority": 1, "start_address": 256 }
///     ]
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.bus.max_ticks, 500);
/// assert_eq!(config.slaves[1].wait_states, 2);
/// assert!(matches!(config.masters[0], MasterConfig::NonBlocking { priority: 1, .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Bus run parameters.
    #[serde(default)]
    pub bus: BusConfig,
    /// Slave address map.
    #[serde(default = "Config::default_slaves")]
    pub slaves: Vec<SlaveConfig>,
    /// Master models attached to the bus.
    #[serde(default = "Config::default_masters")]
    pub masters: Vec<MasterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            slaves: Self::default_slaves(),
            masters: Self::default_masters(),
        }
    }
}

impl Config {
    fn default_slaves() -> Vec<SlaveConfig> {
        vec![
            SlaveConfig {
                name: "mem_fast".to_owned(),
                start: defaults::FAST_MEM_START,
                end: defaults::FAST_MEM_END,
                wait_states: 0,
            },
            SlaveConfig {
                name: "mem_slow".to_owned(),
                start: defaults::SLOW_MEM_START,
                end: defaults::SLOW_MEM_END,
                wait_states: defaults::SLOW_MEM_WAIT_STATES,
            },
        ]
    }

    fn default_masters() -> Vec<MasterConfig> {
        vec![
            MasterConfig::Blocking {
                name: "master_b".to_owned(),
                priority: defaults::BLOCKING_PRIORITY,
                address: defaults::BLOCKING_ADDRESS,
                lock: false,
                timeout: defaults::BLOCKING_TIMEOUT,
                burst_length: BURST_WORDS,
            },
            MasterConfig::NonBlocking {
                name: "master_nb".to_owned(),
                priority: defaults::NON_BLOCKING_PRIORITY,
                start_address: defaults::NON_BLOCKING_ADDRESS,
                lock: false,
                timeout: defaults::NON_BLOCKING_TIMEOUT,
            },
            MasterConfig::Direct {
                name: "master_d".to_owned(),
                address: defaults::DIRECT_ADDRESS,
                timeout: defaults::DIRECT_TIMEOUT,
            },
        ]
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed JSON, `ConfigError::Invalid` if
    /// [`Config::validate`] rejects it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, otherwise as [`Config::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks consistency that the type system cannot express.
    ///
    /// Slave overlap is checked when the bus is built, not here.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` if two bus masters share a priority, two masters or
    /// two slaves share a name, or a blocking master has a zero burst length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut priorities = HashSet::new();
        let mut names = HashSet::new();
        for master in &self.masters {
            if !names.insert(master.name()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate master name {}",
                    master.name()
                )));
            }
            if let Some(priority) = master.priority() {
                if !priorities.insert(priority) {
                    return Err(ConfigError::Invalid(format!(
                        "masters share priority {priority}"
                    )));
                }
            }
            if let MasterConfig::Blocking {
                name,
                burst_length: 0,
                ..
            } = master
            {
                return Err(ConfigError::Invalid(format!(
                    "master {name} has a zero burst length"
                )));
            }
        }

        let mut slave_names = HashSet::new();
        for slave in &self.slaves {
            if !slave_names.insert(slave.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate slave name {}",
                    slave.name
                )));
            }
        }
        Ok(())
    }
}

/// Bus run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Ticks to simulate when the driver is not told otherwise.
    #[serde(default = "BusConfig::default_max_ticks")]
    pub max_ticks: u64,
}

impl BusConfig {
    const fn default_max_ticks() -> u64 {
        defaults::MAX_TICKS
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_ticks: defaults::MAX_TICKS,
        }
    }
}

/// One memory slave of the address map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaveConfig {
    /// Slave name used in logs and errors.
    pub name: String,
    /// First byte address (word aligned).
    pub start: u64,
    /// Last byte address, inclusive (`end + 1` word aligned).
    pub end: u64,
    /// Wait states per word; `0` for a fast memory.
    #[serde(default)]
    pub wait_states: u32,
}

/// A master model attached to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MasterConfig {
    /// Burst read-modify-write master that waits for each transfer to finish.
    Blocking {
        /// Master name.
        name: String,
        /// Unique bus priority.
        priority: u32,
        /// Burst start address.
        address: u64,
        /// Whether bursts are locked.
        #[serde(default)]
        lock: bool,
        /// Idle ticks between bursts.
        #[serde(default)]
        timeout: u64,
        /// Words per burst.
        #[serde(default = "MasterConfig::default_burst_length")]
        burst_length: usize,
    },
    /// Single-word read-modify-write master that polls for completion.
    NonBlocking {
        /// Master name.
        name: String,
        /// Unique bus priority.
        priority: u32,
        /// First address of the walked window.
        start_address: u64,
        /// Whether transfers are locked.
        #[serde(default)]
        lock: bool,
        /// Idle ticks between rounds.
        #[serde(default)]
        timeout: u64,
    },
    /// Debug master using the arbitration-free direct interface.
    Direct {
        /// Master name.
        name: String,
        /// First address of the dumped window.
        address: u64,
        /// Ticks between dumps.
        #[serde(default)]
        timeout: u64,
    },
}

impl MasterConfig {
    const fn default_burst_length() -> usize {
        BURST_WORDS
    }

    /// Master name.
    pub fn name(&self) -> &str {
        match self {
            Self::Blocking { name, .. } | Self::NonBlocking { name, .. } | Self::Direct { name, .. } => {
                name
            }
        }
    }

    /// Bus priority, or `None` for the direct master which never arbitrates.
    pub const fn priority(&self) -> Option<u32> {
        match self {
            Self::Blocking { priority, .. } | Self::NonBlocking { priority, .. } => Some(*priority),
            Self::Direct { .. } => None,
        }
    }
}
