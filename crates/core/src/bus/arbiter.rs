//! Bus arbitration.
//!
//! The arbiter is consulted whenever the bus has no request in flight. It sees
//! every runnable request (status `Request` or `Wait`) and picks exactly one.
//! The default [`PriorityArbiter`] applies three rules, first match wins:
//!
//! 1. **Locked burst:** a request in `Wait` whose lock is `Set` cannot be broken into.
//! 2. **Granted lock:** a request whose lock was granted keeps the bus.
//! 3. **Priority:** the lowest priority value wins; its lock, if any, becomes `Granted`.
//!
//! A freshly locked request therefore still has to win rule 3 once before its lock
//! protects it.

use serde::Serialize;
use std::fmt;
use tracing::{Level, debug, enabled, trace};

use super::request::{BusStatus, LockState, Request};
use crate::common::BusError;

/// Which arbitration rule produced a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArbitrationRule {
    /// Rule 1: continuation of a locked burst.
    LockedBurst,
    /// Rule 2: lock granted in the previous round.
    GrantedLock,
    /// Rule 3: lowest priority value.
    Priority,
}

impl ArbitrationRule {
    /// Rule number as used in traces (1, 2 or 3).
    pub const fn number(self) -> u8 {
        match self {
            Self::LockedBurst => 1,
            Self::GrantedLock => 2,
            Self::Priority => 3,
        }
    }
}

impl fmt::Display for ArbitrationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.number())
    }
}

/// Decision returned by an arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Priority of the winning request.
    pub priority: u32,
    /// Rule that selected it.
    pub rule: ArbitrationRule,
    /// Lock state the winner must adopt.
    pub lock: LockState,
    /// Number of candidates that lost this round.
    pub rejected: usize,
}

/// Selection policy over the runnable requests.
pub trait Arbiter: Send {
    /// Picks one of `candidates`, or `None` if there are none.
    ///
    /// `candidates` holds only runnable requests. The arbiter does not mutate
    /// them; any lock change is carried by the returned [`Grant`].
    ///
    /// # Errors
    ///
    /// Returns `BusError::DuplicatePendingPriority` if two candidates share a priority.
    fn arbitrate(&self, candidates: &[&Request]) -> Result<Option<Grant>, BusError>;
}

/// The three-rule arbiter described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityArbiter;

impl PriorityArbiter {
    /// Creates the arbiter.
    pub const fn new() -> Self {
        Self
    }

    fn check_unique(candidates: &[&Request]) -> Result<(), BusError> {
        for (i, a) in candidates.iter().enumerate() {
            if let Some(dup) = candidates[..i]
                .iter()
                .find(|b| b.priority() == a.priority())
            {
                return Err(BusError::DuplicatePendingPriority {
                    priority: dup.priority(),
                });
            }
        }
        Ok(())
    }
}

impl Arbiter for PriorityArbiter {
    fn arbitrate(&self, candidates: &[&Request]) -> Result<Option<Grant>, BusError> {
        if candidates.is_empty() {
            return Ok(None);
        }
        Self::check_unique(candidates)?;

        if enabled!(Level::TRACE) {
            for r in candidates {
                trace!(
                    "R[{}]({}{}@{:#x})",
                    r.priority(),
                    r.lock_state().tag(),
                    r.status(),
                    r.cursor_address()
                );
            }
        }

        let rejected = candidates.len() - 1;
        let grant = |r: &Request, rule, lock| Grant {
            priority: r.priority(),
            rule,
            lock,
            rejected,
        };

        let decision = if let Some(r) = candidates
            .iter()
            .copied()
            .find(|r| r.status() == BusStatus::Wait && r.lock_state() == LockState::Set)
        {
            grant(r, ArbitrationRule::LockedBurst, r.lock_state())
        } else if let Some(r) = candidates
            .iter()
            .copied()
            .find(|r| r.lock_state() == LockState::Granted)
        {
            grant(r, ArbitrationRule::GrantedLock, r.lock_state())
        } else {
            let Some(best) = candidates.iter().copied().min_by_key(|r| r.priority()) else {
                return Ok(None);
            };
            grant(best, ArbitrationRule::Priority, best.lock_state().grant())
        };

        debug!(
            winner = decision.priority,
            rule = decision.rule.number(),
            rejected,
            "arbitration"
        );
        Ok(Some(decision))
    }
}
