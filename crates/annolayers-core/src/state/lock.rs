//! Lock state machine and the pending-operation queue.
//!
//! ```text
//! Unlocked ──lock──▶ Locked ──stuck_after──▶ StuckDetected
//!    ▲                 │                          │
//!    └─────unlock──────┘◀──────────lock───────────┘ (recovery, stuck marker cleared)
//!                      │                          │
//!                      └─────recover_after────────┴──▶ ForceRecovered
//! ```
//!
//! `ForceRecovered` behaves like `Unlocked`; it records when forced recovery
//! last happened until the next lock.

use super::value::{Patch, StateRecord, StateValue};
use crate::clock::Instant;
use crate::config::StoreConfig;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Deferred patch computation, evaluated against the state at drain time.
pub type Updater = Box<dyn FnOnce(&StateRecord) -> Option<Patch>>;

/// Where the lock currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    Unlocked,
    Locked { since: Instant },
    StuckDetected { since: Instant, detected_at: Instant },
    ForceRecovered { at: Instant },
}

impl LockPhase {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. } | Self::StuckDetected { .. })
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self, Self::StuckDetected { .. })
    }

    fn locked_since(&self) -> Option<Instant> {
        match self {
            Self::Locked { since } | Self::StuckDetected { since, .. } => Some(*since),
            _ => None,
        }
    }
}

/// A write deferred because the store was locked.
pub enum PendingOperation {
    Set { key: String, value: StateValue },
    Update(Patch),
    Atomic(Updater),
}

impl PendingOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Update(_) => "update",
            Self::Atomic(_) => "atomic",
        }
    }
}

impl fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { key, value } => f
                .debug_struct("Set")
                .field("key", key)
                .field("value", value)
                .finish(),
            Self::Update(patch) => f.debug_tuple("Update").field(patch).finish(),
            Self::Atomic(_) => f.write_str("Atomic(..)"),
        }
    }
}

/// Outcome of polling the recovery timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    Idle,
    StuckDetected,
    RecoveryDue,
}

#[derive(Debug)]
pub(crate) struct LockState {
    phase: LockPhase,
    pending: VecDeque<PendingOperation>,
    capacity: usize,
    stuck_after: Duration,
    recover_after: Duration,
}

impl LockState {
    pub(crate) fn new(config: &StoreConfig) -> Self {
        Self {
            phase: LockPhase::Unlocked,
            pending: VecDeque::new(),
            capacity: config.pending_capacity.max(1),
            stuck_after: config.stuck_after(),
            recover_after: config.recover_after(),
        }
    }

    pub(crate) fn phase(&self) -> LockPhase {
        self.phase
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.phase.is_locked()
    }

    /// Enter the critical section. Not counted: a second lock replaces the first.
    pub(crate) fn lock(&mut self, now: Instant) {
        match self.phase {
            LockPhase::StuckDetected { since, .. } => {
                log::info!(
                    "Re-locking state after stuck lock held for {:?}; clearing stuck marker",
                    now.saturating_duration_since(since)
                );
                self.phase = LockPhase::Locked { since: now };
            }
            LockPhase::Locked { .. } => {
                log::debug!("State already locked; lock request ignored");
            }
            LockPhase::Unlocked | LockPhase::ForceRecovered { .. } => {
                self.phase = LockPhase::Locked { since: now };
            }
        }
    }

    pub(crate) fn unlock(&mut self) {
        self.phase = LockPhase::Unlocked;
    }

    /// Clear the lock unconditionally. Returns the number of pending operations.
    pub(crate) fn force_unlock(&mut self, now: Instant) -> usize {
        self.phase = LockPhase::ForceRecovered { at: now };
        self.pending.len()
    }

    /// Advance the timers.
    pub(crate) fn poll(&mut self, now: Instant) -> TimerEvent {
        let Some(since) = self.phase.locked_since() else {
            return TimerEvent::Idle;
        };
        let held = now.saturating_duration_since(since);
        let mut event = TimerEvent::Idle;

        if let LockPhase::Locked { since } = self.phase {
            if held >= self.stuck_after {
                log::warn!(
                    "State lock held for {:?} (threshold {:?}); a matching unlock may be missing",
                    held,
                    self.stuck_after
                );
                self.phase = LockPhase::StuckDetected {
                    since,
                    detected_at: now,
                };
                event = TimerEvent::StuckDetected;
            }
        }
        if held >= self.recover_after {
            event = TimerEvent::RecoveryDue;
        }
        event
    }

    /// Queue an operation, dropping the oldest one if the queue is full.
    pub(crate) fn enqueue(&mut self, op: PendingOperation) {
        if self.pending.len() >= self.capacity {
            if let Some(dropped) = self.pending.pop_front() {
                log::warn!(
                    "Pending operation queue full ({}); dropping oldest {} operation",
                    self.capacity,
                    dropped.kind()
                );
            }
        }
        self.pending.push_back(op);
    }

    pub(crate) fn next_pending(&mut self) -> Option<PendingOperation> {
        self.pending.pop_front()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.phase = LockPhase::Unlocked;
    }
}
