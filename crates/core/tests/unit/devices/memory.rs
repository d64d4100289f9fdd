//! Memory slave tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simbus_core::bus::{Slave, SlaveStatus};
use simbus_core::common::BusError;
use simbus_core::devices::Memory;

#[test]
fn fast_memory_answers_immediately() {
    let mut mem = Memory::fast("mem", 0x100, 0x1FF).unwrap();
    assert_eq!(mem.write(0xCAFE, 0x104), SlaveStatus::Ok);
    let mut word = 0;
    assert_eq!(mem.read(&mut word, 0x104), SlaveStatus::Ok);
    assert_eq!(word, 0xCAFE);
    assert_eq!(mem.peek(0x104), Some(0xCAFE));
}

#[test]
fn reports_its_range() {
    let mem = Memory::slow("mem_slow", 0x80, 0xFF, 1).unwrap();
    assert_eq!(mem.name(), "mem_slow");
    assert_eq!(mem.start_address(), 0x80);
    assert_eq!(mem.end_address(), 0xFF);
    assert_eq!(mem.wait_states(), 1);
    assert!(mem.contains(0xFC));
    assert!(!mem.contains(0x100));
}

#[rstest]
#[case(0x7C)]
#[case(0x200)]
fn out_of_range_is_an_error(#[case] address: u64) {
    let mut mem = Memory::fast("mem", 0x100, 0x1FF).unwrap();
    let mut word = 3;
    assert_eq!(mem.read(&mut word, address), SlaveStatus::Error);
    assert_eq!(word, 3);
    assert_eq!(mem.write(1, address), SlaveStatus::Error);
    assert!(!mem.direct_read(&mut word, address));
    assert!(!mem.direct_write(1, address));
}

#[rstest]
#[case::reversed(0x10, 0x0F)]
#[case::unaligned_start(0x01, 0x0F)]
#[case::unaligned_end(0x00, 0x0D)]
#[case::whole_address_space(0x00, u64::MAX)]
#[case::too_large(0x00, 0x1_0000_0003)]
fn malformed_range_is_rejected(#[case] start: u64, #[case] end: u64) {
    let err = Memory::new("bad", start, end, 0).unwrap_err();
    assert_eq!(
        err,
        BusError::InvalidSlaveRange {
            name: "bad".to_owned(),
            start,
            end,
        }
    );
}

#[test]
fn slow_write_lands_after_waiting() {
    let mut mem = Memory::slow("mem", 0x0, 0xF, 2).unwrap();
    assert_eq!(mem.write(5, 0x8), SlaveStatus::Wait);
    assert_eq!(mem.peek(0x8), Some(0));
    assert_eq!(mem.write(5, 0x8), SlaveStatus::Wait);
    assert_eq!(mem.write(5, 0x8), SlaveStatus::Ok);
    assert_eq!(mem.peek(0x8), Some(5));

    assert_eq!(mem.write(6, 0x8), SlaveStatus::Wait);
}

#[test]
fn direct_access_skips_wait_states() {
    let mut mem = Memory::slow("mem", 0x0, 0xF, 4).unwrap();
    assert!(mem.direct_write(11, 0x4));
    let mut word = 0;
    assert!(mem.direct_read(&mut word, 0x4));
    assert_eq!(word, 11);
    assert!(mem.poke(0xC, 12));
    assert!(!mem.poke(0x10, 13));
}
