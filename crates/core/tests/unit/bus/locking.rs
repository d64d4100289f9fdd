//! Lock lifecycle tests.
//!
//! Each scenario drives a real bus tick by tick and checks which rule chose
//! each unit, so the lock state machine is observed end to end.

use pretty_assertions::assert_eq;
use simbus_core::bus::{ArbitrationRule, BusStatus, LockState};

use crate::common::harness::{fast_bus, observe, run_ticks, split_bus, unit_priorities};

use ArbitrationRule::{GrantedLock, LockedBurst, Priority};

#[test]
fn locked_burst_is_not_interrupted() {
    let mut bus = fast_bus();
    let log = observe(&mut bus);
    bus.burst_read(5, 0x0, 4, true).unwrap();
    let first = run_ticks(&mut bus, 1);
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::Set);

    bus.read(0, 0x80, false).unwrap();
    let rest = run_ticks(&mut bus, 4);

    assert_eq!(unit_priorities(&first), vec![5]);
    assert_eq!(unit_priorities(&rest), vec![5, 5, 5, 0]);
    assert_eq!(
        log.rules(),
        vec![Priority, LockedBurst, LockedBurst, LockedBurst, Priority]
    );
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::None);
}

#[test]
fn lower_priority_waits_for_the_whole_locked_burst() {
    let mut bus = fast_bus();
    bus.burst_write(5, vec![1; 8], 0x0, true).unwrap();
    let _ = run_ticks(&mut bus, 1);
    bus.write(0, 9, 0x80, false).unwrap();

    let mut ticks = 0;
    while bus.poll(0) != BusStatus::Ok {
        let _ = bus.tick().unwrap();
        ticks += 1;
        assert!(ticks < 20);
    }
    assert_eq!(ticks, 8);
    assert_eq!(bus.poll(5), BusStatus::Ok);
}

#[test]
fn locked_burst_holds_through_wait_states() {
    let mut bus = split_bus(1);
    bus.burst_read(5, 0x80, 2, true).unwrap();
    let first = run_ticks(&mut bus, 2);
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::Set);

    bus.read(0, 0x0, false).unwrap();
    let rest = run_ticks(&mut bus, 3);

    assert_eq!(unit_priorities(&first), vec![5, 5]);
    assert_eq!(unit_priorities(&rest), vec![5, 5, 0]);
}

#[test]
fn lock_chains_back_to_back_transfers() {
    let mut bus = fast_bus();
    let log = observe(&mut bus);
    bus.write(5, 1, 0x0, true).unwrap();
    let _ = run_ticks(&mut bus, 1);
    assert_eq!(bus.poll(5), BusStatus::Ok);
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::Set);

    bus.write(5, 2, 0x4, true).unwrap();
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::Granted);
    bus.write(0, 3, 0x8, false).unwrap();
    let units = run_ticks(&mut bus, 2);

    assert_eq!(unit_priorities(&units), vec![5, 0]);
    assert_eq!(log.rules(), vec![Priority, GrantedLock, Priority]);
}

#[test]
fn lock_lapses_after_an_idle_tick() {
    let mut bus = fast_bus();
    bus.write(5, 1, 0x0, true).unwrap();
    let _ = run_ticks(&mut bus, 2);
    assert_eq!(bus.request(5).unwrap().lock_state(), LockState::None);

    bus.write(5, 2, 0x4, true).unwrap();
    bus.write(0, 3, 0x8, false).unwrap();
    let units = run_ticks(&mut bus, 2);
    assert_eq!(unit_priorities(&units), vec![0, 5]);
}

#[test]
fn unlocked_requests_never_hold_a_lock() {
    let mut bus = fast_bus();
    bus.burst_read(3, 0x0, 4, false).unwrap();
    for _ in 0..4 {
        let _ = bus.tick().unwrap();
        assert_eq!(bus.request(3).unwrap().lock_state(), LockState::None);
    }
}

#[test]
fn freshly_locked_request_still_needs_priority() {
    let mut bus = fast_bus();
    bus.read(5, 0x0, true).unwrap();
    bus.read(1, 0x4, false).unwrap();
    let units = run_ticks(&mut bus, 2);
    assert_eq!(unit_priorities(&units), vec![1, 5]);
}
