//! Slave registration and address routing tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simbus_core::bus::SlaveDirectory;
use simbus_core::common::BusError;

use crate::common::mocks::slave::MockedSlave;

fn two_slaves() -> SlaveDirectory {
    let mut directory = SlaveDirectory::new();
    directory
        .register(Box::new(MockedSlave::idle("a", 0x00, 0x0F)))
        .unwrap();
    directory
        .register(Box::new(MockedSlave::idle("b", 0x10, 0x1F)))
        .unwrap();
    directory
}

#[test]
fn overlapping_range_is_rejected() {
    let mut directory = two_slaves();
    let err = directory
        .register(Box::new(MockedSlave::idle("c", 0x08, 0x18)))
        .unwrap_err();
    assert_eq!(
        err,
        BusError::OverlappingSlaveRanges {
            new_name: "c".to_owned(),
            new_start: 0x08,
            new_end: 0x18,
            existing_name: "a".to_owned(),
            existing_start: 0x00,
            existing_end: 0x0F,
        }
    );
    assert_eq!(directory.len(), 2);
}

#[rstest]
#[case(0x00, Some("a"))]
#[case(0x0C, Some("a"))]
#[case(0x10, Some("b"))]
#[case(0x1F, Some("b"))]
#[case(0x20, None)]
fn resolves_owner(#[case] address: u64, #[case] owner: Option<&str>) {
    let mut directory = two_slaves();
    let name = directory.resolve(address).map(|s| s.name().to_owned());
    assert_eq!(name.as_deref(), owner);
}

#[rstest]
#[case::empty(0x10, 0x0F)]
#[case::unaligned_start(0x02, 0x0F)]
#[case::unaligned_end(0x00, 0x0E)]
fn malformed_range_is_rejected(#[case] start: u64, #[case] end: u64) {
    let mut directory = SlaveDirectory::new();
    let err = directory
        .register(Box::new(MockedSlave::idle("bad", start, end)))
        .unwrap_err();
    assert_eq!(
        err,
        BusError::InvalidSlaveRange {
            name: "bad".to_owned(),
            start,
            end,
        }
    );
    assert!(directory.is_empty());
}

#[test]
fn iterates_in_registration_order() {
    let directory = two_slaves();
    let names: Vec<&str> = directory.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
