//! Configuration loading and validation tests.

use pretty_assertions::assert_eq;
use simbus_core::common::{BusError, ConfigError};
use simbus_core::config::{Config, MasterConfig, SlaveConfig};
use simbus_core::sim::build_bus;
use std::io::Write;

#[test]
fn default_is_the_reference_bench() {
    let config = Config::default();
    assert_eq!(config.bus.max_ticks, 10_000);
    assert_eq!(
        config.slaves,
        vec![
            SlaveConfig {
                name: "mem_fast".to_owned(),
                start: 0x00,
                end: 0x7F,
                wait_states: 0,
            },
            SlaveConfig {
                name: "mem_slow".to_owned(),
                start: 0x80,
                end: 0xFF,
                wait_states: 1,
            },
        ]
    );
    let priorities: Vec<Option<u32>> = config.masters.iter().map(MasterConfig::priority).collect();
    assert_eq!(priorities, vec![Some(4), Some(3), None]);
    assert!(matches!(
        config.masters[0],
        MasterConfig::Blocking {
            address: 0x4C,
            timeout: 300,
            burst_length: 16,
            lock: false,
            ..
        }
    ));
    assert!(matches!(
        config.masters[1],
        MasterConfig::NonBlocking {
            start_address: 0x38,
            timeout: 20,
            ..
        }
    ));
    assert!(matches!(
        config.masters[2],
        MasterConfig::Direct {
            address: 0x78,
            timeout: 100,
            ..
        }
    ));
    config.validate().unwrap();
}

#[test]
fn empty_object_is_the_default() {
    assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "slaves": [{{ "name": "ram", "start": 0, "end": 63, "wait_states": 2 }}],
            "masters": [
                {{ "kind": "blocking", "name": "dma", "priority": 1, "address": 16, "lock": true, "burst_length": 4 }}
            ]
        }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.slaves.len(), 1);
    assert_eq!(config.slaves[0].wait_states, 2);
    assert_eq!(
        config.masters,
        vec![MasterConfig::Blocking {
            name: "dma".to_owned(),
            priority: 1,
            address: 16,
            lock: true,
            timeout: 0,
            burst_length: 4,
        }]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        Config::from_json_str("{ \"bus\": "),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::from_json_str(r#"{ "clock": 1 }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn shared_priority_is_invalid() {
    let json = r#"{ "masters": [
        { "kind": "blocking", "name": "a", "priority": 2, "address": 0 },
        { "kind": "non_blocking", "name": "b", "priority": 2, "start_address": 0 }
    ] }"#;
    assert!(matches!(
        Config::from_json_str(json),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn zero_burst_length_is_invalid() {
    let json = r#"{ "masters": [
        { "kind": "blocking", "name": "a", "priority": 2, "address": 0, "burst_length": 0 }
    ] }"#;
    assert!(matches!(
        Config::from_json_str(json),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn direct_masters_do_not_compete_for_priorities() {
    let json = r#"{ "masters": [
        { "kind": "direct", "name": "d1", "address": 0 },
        { "kind": "direct", "name": "d2", "address": 4 }
    ] }"#;
    let config = Config::from_json_str(json).unwrap();
    assert_eq!(config.masters.len(), 2);
}

#[test]
fn overlapping_slaves_fail_when_building() {
    let json = r#"{ "slaves": [
        { "name": "a", "start": 0, "end": 127 },
        { "name": "b", "start": 64, "end": 191 }
    ] }"#;
    let config = Config::from_json_str(json).unwrap();
    let err = build_bus(&config).unwrap_err();
    assert!(matches!(err, BusError::OverlappingSlaveRanges { .. }));
}

#[test]
fn unbacked_memory_size_fails_when_building() {
    let json = r#"{ "slaves": [
        { "name": "all", "start": 0, "end": 18446744073709551615 }
    ] }"#;
    let config = Config::from_json_str(json).unwrap();
    let err = build_bus(&config).unwrap_err();
    assert!(matches!(err, BusError::InvalidSlaveRange { start: 0, end: u64::MAX, .. }));
}
