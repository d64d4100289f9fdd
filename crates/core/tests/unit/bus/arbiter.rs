//! Arbitration rule tests.
//!
//! Requests are built directly in the state under test, so each case checks
//! one rule without driving a bus.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simbus_core::bus::{
    Arbiter, ArbitrationRule, BusStatus, Grant, LockState, PriorityArbiter, Request,
};
use simbus_core::common::BusError;

fn arbitrate(requests: &[Request]) -> Result<Option<Grant>, BusError> {
    let candidates: Vec<&Request> = requests.iter().collect();
    PriorityArbiter::new().arbitrate(&candidates)
}

fn pending(priority: u32) -> Request {
    Request::in_state(priority, BusStatus::Request, LockState::None, 0x0)
}

#[test]
fn no_candidates_no_grant() {
    assert_eq!(arbitrate(&[]).unwrap(), None);
}

#[test]
fn lowest_priority_value_wins() {
    let grant = arbitrate(&[pending(5), pending(2), pending(9)])
        .unwrap()
        .unwrap();
    assert_eq!(
        grant,
        Grant {
            priority: 2,
            rule: ArbitrationRule::Priority,
            lock: LockState::None,
            rejected: 2,
        }
    );
}

#[test]
fn priority_winner_with_lock_is_granted() {
    let locked = Request::in_state(3, BusStatus::Request, LockState::Set, 0x0);
    let grant = arbitrate(&[pending(8), locked]).unwrap().unwrap();
    assert_eq!(grant.priority, 3);
    assert_eq!(grant.lock, LockState::Granted);
}

#[rstest]
#[case::locked_burst(BusStatus::Wait, LockState::Set, ArbitrationRule::LockedBurst)]
#[case::granted_pending(BusStatus::Request, LockState::Granted, ArbitrationRule::GrantedLock)]
#[case::granted_mid_burst(BusStatus::Wait, LockState::Granted, ArbitrationRule::GrantedLock)]
fn lock_beats_lower_priority(
    #[case] status: BusStatus,
    #[case] lock: LockState,
    #[case] rule: ArbitrationRule,
) {
    let holder = Request::in_state(7, status, lock, 0x40);
    let grant = arbitrate(&[pending(0), holder]).unwrap().unwrap();
    assert_eq!(grant.priority, 7);
    assert_eq!(grant.rule, rule);
    assert_eq!(grant.lock, lock);
    assert_eq!(grant.rejected, 1);
}

#[test]
fn set_lock_without_burst_in_progress_has_no_effect() {
    let fresh = Request::in_state(7, BusStatus::Request, LockState::Set, 0x0);
    let grant = arbitrate(&[fresh, pending(1)]).unwrap().unwrap();
    assert_eq!(grant.priority, 1);
    assert_eq!(grant.rule, ArbitrationRule::Priority);
}

#[test]
fn unlocked_burst_in_progress_can_be_overtaken() {
    let burst = Request::in_state(7, BusStatus::Wait, LockState::None, 0x44);
    let grant = arbitrate(&[burst, pending(1)]).unwrap().unwrap();
    assert_eq!(grant.priority, 1);
}

#[test]
fn locked_burst_rule_checked_before_granted_lock() {
    let granted = Request::in_state(6, BusStatus::Request, LockState::Granted, 0x0);
    let bursting = Request::in_state(4, BusStatus::Wait, LockState::Set, 0x0);
    let grant = arbitrate(&[granted, bursting]).unwrap().unwrap();
    assert_eq!(grant.priority, 4);
    assert_eq!(grant.rule, ArbitrationRule::LockedBurst);
}

#[test]
fn duplicate_priorities_are_fatal() {
    let err = arbitrate(&[pending(3), pending(1), pending(3)]).unwrap_err();
    assert_eq!(err, BusError::DuplicatePendingPriority { priority: 3 });
}

#[test]
fn rule_numbers() {
    assert_eq!(ArbitrationRule::LockedBurst.number(), 1);
    assert_eq!(ArbitrationRule::GrantedLock.number(), 2);
    assert_eq!(ArbitrationRule::Priority.to_string(), "rule 3");
}
