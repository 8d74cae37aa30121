//! Observable editor state with a lock for reentrant updates.
//!
//! [`StateStore`] is a cheap, cloneable handle. Listeners may capture a clone
//! and call back into the store while being notified. No internal borrow is
//! held while a listener or updater runs.
//!
//! While the store is locked, writes are queued and applied in arrival order
//! on unlock. A lock that is never released is reported after
//! `stuck_after` and forcibly released after `recover_after`.

mod layers;
mod listeners;
mod lock;
mod value;

pub use listeners::{KeyListener, WILDCARD_KEY, WildcardListener};
pub use lock::{LockPhase, PendingOperation, Updater};
pub use value::{
    CURRENT_TOOL_KEY, IS_DIRTY_KEY, IS_DRAWING_KEY, LAYERS_KEY, PAN_X_KEY, PAN_Y_KEY, Patch,
    SELECTED_LAYER_IDS_KEY, StateRecord, StateValue, ZOOM_KEY, default_record,
};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{CallbackResult, StoreError, StoreResult};
use listeners::{ListenerId, ListenerRegistry, ListenerSlot};
use lock::{LockState, TimerEvent};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Inner {
    record: StateRecord,
    listeners: ListenerRegistry,
    lock: LockState,
    config: StoreConfig,
    destroyed: bool,
}

/// One key whose value actually changed.
struct Change {
    key: String,
    new: StateValue,
    old: StateValue,
}

impl Inner {
    /// Apply every entry, or none if any entry is invalid.
    fn apply_patch(&mut self, patch: Patch) -> StoreResult<Vec<Change>> {
        let entries = patch.into_entries();
        for (key, value) in &entries {
            validate(key, value)?;
        }

        let mut changes = Vec::new();
        for (key, value) in entries {
            let unchanged = self
                .record
                .get(&key)
                .map_or(value.is_null(), |old| *old == value);
            if unchanged {
                continue;
            }
            let old = self
                .record
                .insert(key.clone(), value.clone())
                .unwrap_or_default();
            changes.push(Change {
                key,
                new: value,
                old,
            });
        }
        Ok(changes)
    }
}

fn validate(key: &str, value: &StateValue) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::EmptyKey);
    }
    let expected = match key {
        LAYERS_KEY if !matches!(value, StateValue::Layers(_)) => "layers",
        SELECTED_LAYER_IDS_KEY if !matches!(value, StateValue::Ids(_)) => "ids",
        _ => return Ok(()),
    };
    Err(StoreError::InvalidValue {
        key: key.to_string(),
        expected,
    })
}

/// Handle to the editor's state record.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<RefCell<Inner>>,
    clock: Rc<dyn Clock>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateStore")
            .field("keys", &inner.record.len())
            .field("listeners", &inner.listeners.len())
            .field("phase", &inner.lock.phase())
            .field("pending", &inner.lock.pending_len())
            .field("destroyed", &inner.destroyed)
            .finish()
    }
}

impl StateStore {
    /// Create a store with the default record and settings.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    /// Create a store whose timers run on `clock`.
    pub fn with_clock(config: StoreConfig, clock: Rc<dyn Clock>) -> Self {
        let inner = Inner {
            record: default_record(),
            listeners: ListenerRegistry::default(),
            lock: LockState::new(&config),
            config,
            destroyed: false,
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
            clock,
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.inner.borrow().config.clone()
    }

    // --- Reads ---

    /// Copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<StateValue> {
        self.inner.borrow().record.get(key).cloned()
    }

    /// Copy of the whole record.
    pub fn get_state(&self) -> StateRecord {
        self.inner.borrow().record.clone()
    }

    // --- Writes ---

    /// Set one key. Listeners fire only if the value changed.
    pub fn set(&self, key: impl Into<String>, value: impl Into<StateValue>) -> StoreResult<()> {
        self.submit(PendingOperation::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Set several keys. Every changed key is written before any listener fires.
    pub fn update(&self, patch: Patch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.submit(PendingOperation::Update(patch))
    }

    /// Compute a patch from the current state and apply it like [`update`](Self::update).
    ///
    /// While locked, `updater` is queued and runs against the state as it is
    /// when the queue drains. Returning `None` or an empty patch is a no-op.
    pub fn atomic<F>(&self, updater: F) -> StoreResult<()>
    where
        F: FnOnce(&StateRecord) -> Option<Patch> + 'static,
    {
        self.submit(PendingOperation::Atomic(Box::new(updater)))
    }

    fn submit(&self, op: PendingOperation) -> StoreResult<()> {
        self.tick();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Ok(());
            }
            if inner.lock.is_locked() {
                log::debug!("State locked; queued {} operation", op.kind());
                inner.lock.enqueue(op);
                return Ok(());
            }
        }
        self.apply_operation(op)
    }

    fn apply_operation(&self, op: PendingOperation) -> StoreResult<()> {
        let patch = match op {
            PendingOperation::Set { key, value } => Patch::single(key, value),
            PendingOperation::Update(patch) => patch,
            PendingOperation::Atomic(updater) => {
                let state = self.get_state();
                match updater(&state) {
                    Some(patch) => patch,
                    None => return Ok(()),
                }
            }
        };
        if patch.is_empty() {
            return Ok(());
        }

        let changes = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Ok(());
            }
            inner.apply_patch(patch)?
        };
        self.notify(&changes);
        Ok(())
    }

    fn notify(&self, changes: &[Change]) {
        for change in changes {
            let (keyed, wildcards) = {
                let inner = self.inner.borrow();
                (
                    inner.listeners.for_key(&change.key),
                    inner.listeners.wildcards(),
                )
            };
            for listener in keyed {
                if let Err(e) = listener(&change.new, &change.old, &change.key) {
                    log::error!("Listener for `{}` failed: {}", change.key, e);
                }
            }
            for listener in wildcards {
                if let Err(e) = listener(&change.key, &change.new, &change.old) {
                    log::error!("Wildcard listener failed on `{}`: {}", change.key, e);
                }
            }
        }
    }

    // --- Subscriptions ---

    /// Listen for changes to `key`. [`WILDCARD_KEY`] listens to every key.
    pub fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&StateValue, &StateValue, &str) -> CallbackResult + 'static,
    {
        if key == WILDCARD_KEY {
            return self.subscribe_all(move |key, new, old| listener(new, old, key));
        }
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return Subscription::inert();
        }
        let id = inner.listeners.add_key(key, Rc::new(listener));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            slot: ListenerSlot::Key(key.to_string()),
            id,
        }
    }

    /// Listen for changes to any key.
    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str, &StateValue, &StateValue) -> CallbackResult + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return Subscription::inert();
        }
        let id = inner.listeners.add_wildcard(Rc::new(listener));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            slot: ListenerSlot::Wildcard,
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    // --- Lock ---

    /// Begin a critical section. Writes are queued until [`unlock_state`](Self::unlock_state).
    pub fn lock_state(&self) {
        self.tick();
        let now = self.clock.now();
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return;
        }
        inner.lock.lock(now);
    }

    /// End the critical section and apply queued writes in order.
    pub fn unlock_state(&self) {
        self.tick();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            inner.lock.unlock();
        }
        self.drain_pending();
    }

    /// Release the lock unconditionally and drain the queue.
    /// Returns how many operations were pending.
    pub fn force_unlock(&self, reason: Option<&str>) -> usize {
        if self.inner.borrow().destroyed {
            return 0;
        }
        let pending = self.inner.borrow().lock.pending_len();
        log::warn!(
            "Force-unlocking state ({}); {} pending operation(s)",
            reason.unwrap_or("manual recovery"),
            pending
        );
        self.force_release()
    }

    fn force_release(&self) -> usize {
        let now = self.clock.now();
        let pending = self.inner.borrow_mut().lock.force_unlock(now);
        self.drain_pending();
        pending
    }

    /// Check the recovery timers. Hosts call this periodically; every write
    /// and lock call also does.
    pub fn tick(&self) {
        let now = self.clock.now();
        let (event, pending, recover_after) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            let event = inner.lock.poll(now);
            (event, inner.lock.pending_len(), inner.config.recover_after())
        };
        if event == TimerEvent::RecoveryDue {
            log::error!(
                "State lock not released within {:?}; forcing recovery with {} pending operation(s). Some state may be inconsistent",
                recover_after,
                pending
            );
            self.force_release();
        }
    }

    fn drain_pending(&self) {
        let mut applied = 0usize;
        let mut failed = 0usize;
        loop {
            let op = {
                let mut inner = self.inner.borrow_mut();
                if inner.destroyed || inner.lock.is_locked() {
                    break;
                }
                match inner.lock.next_pending() {
                    Some(op) => op,
                    None => break,
                }
            };
            let kind = op.kind();
            match self.apply_operation(op) {
                Ok(()) => applied += 1,
                Err(e) => {
                    failed += 1;
                    log::error!("Pending {} operation failed: {}", kind, e);
                }
            }
        }
        if applied + failed > 0 {
            log::debug!(
                "Drained pending operations: {} applied, {} failed",
                applied,
                failed
            );
        }
    }

    /// Polls the timers first, so an expired lock reads as released.
    pub fn is_locked(&self) -> bool {
        self.tick();
        self.inner.borrow().lock.is_locked()
    }

    /// Polls the timers first, like [`is_locked`](Self::is_locked).
    pub fn lock_phase(&self) -> LockPhase {
        self.tick();
        self.inner.borrow().lock.phase()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.borrow().lock.pending_len()
    }

    // --- Lifecycle ---

    /// Tear the store down. Later writes are ignored and reads return nothing.
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return;
        }
        inner.destroyed = true;
        inner.record.clear();
        inner.listeners.clear();
        inner.lock.clear();
        log::debug!("State store destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }
}

/// Registration handle returned by [`StateStore::subscribe`].
///
/// Dropping it does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<RefCell<Inner>>,
    slot: ListenerSlot,
    id: ListenerId,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            inner: Weak::new(),
            slot: ListenerSlot::Wildcard,
            id: 0,
        }
    }

    /// Remove the listener. Repeated calls, or calls after the store is gone, do nothing.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().listeners.remove(&self.slot, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;
    use std::time::Duration;

    fn store_with_clock() -> (StateStore, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let store = StateStore::with_clock(StoreConfig::default(), clock.clone());
        (store, clock)
    }

    fn number(store: &StateStore, key: &str) -> Option<f64> {
        store.get(key).and_then(|v| v.as_f64())
    }

    #[test]
    fn test_set_and_get() {
        let store = StateStore::new();
        store.set("zoom", 2.0).unwrap();
        assert_eq!(number(&store, "zoom"), Some(2.0));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_get_state_is_a_copy() {
        let store = StateStore::new();
        let mut copy = store.get_state();
        copy.insert("zoom".into(), StateValue::Number(9.0));
        assert_eq!(number(&store, "zoom"), Some(1.0));
    }

    #[test]
    fn test_listener_fires_only_on_change() {
        let store = StateStore::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        store.subscribe("zoom", move |new, old, key| {
            seen.borrow_mut()
                .push((key.to_string(), new.as_f64(), old.as_f64()));
            Ok(())
        });

        store.set("zoom", 2.0).unwrap();
        store.set("zoom", 2.0).unwrap();
        store.set("panX", 5.0).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![("zoom".to_string(), Some(2.0), Some(1.0))]
        );
    }

    #[test]
    fn test_wildcard_listener_argument_order() {
        let store = StateStore::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        store.subscribe_all(move |key, new, old| {
            seen.borrow_mut()
                .push((key.to_string(), new.clone(), old.clone()));
            Ok(())
        });

        store.set("currentTool", "text").unwrap();
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "currentTool");
        assert_eq!(calls[0].1.as_str(), Some("text"));
        assert_eq!(calls[0].2.as_str(), Some("pointer"));
    }

    #[test]
    fn test_subscribe_with_wildcard_key() {
        let store = StateStore::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        store.subscribe(WILDCARD_KEY, move |_, _, key| {
            assert!(!key.is_empty());
            c.set(c.get() + 1);
            Ok(())
        });
        store.set("zoom", 3.0).unwrap();
        store.set("panY", 1.0).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_update_applies_all_keys_before_notifying() {
        let store = StateStore::new();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = observed.clone();
        let handle = store.clone();
        store.subscribe("panX", move |_, _, _| {
            // panY must already be written when panX listeners run
            seen.borrow_mut().push(handle.get("panY").and_then(|v| v.as_f64()));
            Ok(())
        });

        store
            .update(Patch::new().with("panX", 10.0).with("panY", 20.0))
            .unwrap();
        assert_eq!(*observed.borrow(), vec![Some(20.0)]);
    }

    #[test]
    fn test_update_only_notifies_changed_keys() {
        let store = StateStore::new();
        let keys = Rc::new(RefCell::new(Vec::new()));
        let seen = keys.clone();
        store.subscribe_all(move |key, _, _| {
            seen.borrow_mut().push(key.to_string());
            Ok(())
        });
        store
            .update(Patch::new().with("zoom", 1.0).with("panX", 4.0))
            .unwrap();
        assert_eq!(*keys.borrow(), vec!["panX".to_string()]);
    }

    #[test]
    fn test_invalid_patch_is_rejected_whole() {
        let store = StateStore::new();
        let result = store.update(Patch::new().with("zoom", 4.0).with(LAYERS_KEY, 1.0));
        assert!(matches!(result, Err(StoreError::InvalidValue { .. })));
        assert_eq!(number(&store, "zoom"), Some(1.0));

        assert!(matches!(store.set("", 1.0), Err(StoreError::EmptyKey)));
    }

    #[test]
    fn test_atomic_reads_current_state() {
        let store = StateStore::new();
        store.set("zoom", 2.0).unwrap();
        store
            .atomic(|state| {
                let zoom = state.get("zoom").and_then(StateValue::as_f64)?;
                Some(Patch::single("zoom", zoom * 2.0))
            })
            .unwrap();
        assert_eq!(number(&store, "zoom"), Some(4.0));

        store.atomic(|_| None).unwrap();
        store.atomic(|_| Some(Patch::new())).unwrap();
        assert_eq!(number(&store, "zoom"), Some(4.0));
    }

    #[test]
    fn test_failing_listener_does_not_stop_others() {
        let store = StateStore::new();
        let reached = Rc::new(Cell::new(false));
        let r = reached.clone();
        store.subscribe("zoom", |_, _, _| Err("boom".into()));
        store.subscribe("zoom", move |_, _, _| {
            r.set(true);
            Ok(())
        });
        store.set("zoom", 5.0).unwrap();
        assert!(reached.get());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = StateStore::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = store.subscribe("zoom", move |_, _, _| {
            c.set(c.get() + 1);
            Ok(())
        });
        store.set("zoom", 2.0).unwrap();
        sub.unsubscribe();
        sub.unsubscribe();
        store.set("zoom", 3.0).unwrap();
        assert_eq!(count.get(), 1);

        store.destroy();
        sub.unsubscribe();
        drop(store);
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_can_reenter_store() {
        let store = StateStore::new();
        let handle = store.clone();
        store.subscribe("currentTool", move |new, _, _| {
            if new.as_str() == Some("text") {
                handle.set("isDrawing", true)?;
            }
            Ok(())
        });
        store.set("currentTool", "text").unwrap();
        assert_eq!(store.get("isDrawing").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_locked_writes_are_queued_in_order() {
        let store = StateStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let seen = order.clone();
        store.subscribe("zoom", move |new, _, _| {
            seen.borrow_mut().push(new.as_f64());
            Ok(())
        });

        store.lock_state();
        store.set("zoom", 2.0).unwrap();
        store.update(Patch::single("zoom", 3.0)).unwrap();
        store
            .atomic(|state| {
                let zoom = state.get("zoom").and_then(StateValue::as_f64)?;
                Some(Patch::single("zoom", zoom + 1.0))
            })
            .unwrap();

        assert_eq!(number(&store, "zoom"), Some(1.0));
        assert_eq!(store.pending_len(), 3);
        assert!(order.borrow().is_empty());

        store.unlock_state();
        assert_eq!(number(&store, "zoom"), Some(4.0));
        assert_eq!(*order.borrow(), vec![Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_bad_pending_operation_is_skipped() {
        let store = StateStore::new();
        store.lock_state();
        store.set("panX", 1.0).unwrap();
        store.set("", 2.0).unwrap();
        store.set(LAYERS_KEY, "not layers").unwrap();
        store.set("panY", 3.0).unwrap();
        store.unlock_state();

        assert_eq!(number(&store, "panX"), Some(1.0));
        assert_eq!(number(&store, "panY"), Some(3.0));
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_relock_during_drain_keeps_rest_queued() {
        let store = StateStore::new();
        let handle = store.clone();
        store.subscribe("isDrawing", move |new, _, _| {
            if new.as_bool() == Some(true) {
                handle.lock_state();
            }
            Ok(())
        });

        store.lock_state();
        store.set("isDrawing", true).unwrap();
        store.set("zoom", 2.0).unwrap();
        store.unlock_state();

        assert!(store.is_locked());
        assert_eq!(number(&store, "zoom"), Some(1.0));
        assert_eq!(store.pending_len(), 1);

        store.unlock_state();
        assert_eq!(number(&store, "zoom"), Some(2.0));
    }

    #[test]
    fn test_pending_queue_overflow_drops_oldest() {
        let config = StoreConfig {
            pending_capacity: 2,
            ..StoreConfig::default()
        };
        let store = StateStore::with_config(config);
        store.lock_state();
        store.set("panX", 1.0).unwrap();
        store.set("panY", 2.0).unwrap();
        store.set("zoom", 3.0).unwrap();
        assert_eq!(store.pending_len(), 2);
        store.unlock_state();

        assert_eq!(number(&store, "panX"), Some(0.0));
        assert_eq!(number(&store, "panY"), Some(2.0));
        assert_eq!(number(&store, "zoom"), Some(3.0));
    }

    #[test]
    fn test_stuck_lock_is_only_reported() {
        let (store, clock) = store_with_clock();
        store.lock_state();
        store.set("zoom", 2.0).unwrap();

        clock.advance(Duration::from_secs(6));
        store.tick();
        assert!(store.lock_phase().is_stuck());
        assert!(store.is_locked());
        assert_eq!(number(&store, "zoom"), Some(1.0));
    }

    #[test]
    fn test_relock_after_stuck_restarts_timers() {
        let (store, clock) = store_with_clock();
        store.lock_state();
        clock.advance(Duration::from_secs(6));
        store.tick();
        assert!(store.lock_phase().is_stuck());

        store.lock_state();
        assert!(matches!(store.lock_phase(), LockPhase::Locked { .. }));

        clock.advance(Duration::from_secs(25));
        store.tick();
        assert!(store.is_locked());
    }

    #[test]
    fn test_lock_auto_recovers_after_timeout() {
        let (store, clock) = store_with_clock();
        store.lock_state();
        store.set("zoom", 2.0).unwrap();
        store.set("", 1.0).unwrap();
        store.set("panX", 7.0).unwrap();

        clock.advance(Duration::from_secs(31));
        store.tick();

        assert!(!store.is_locked());
        assert!(matches!(store.lock_phase(), LockPhase::ForceRecovered { .. }));
        assert_eq!(number(&store, "zoom"), Some(2.0));
        assert_eq!(number(&store, "panX"), Some(7.0));
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_expired_lock_reads_as_released_without_tick() {
        let (store, clock) = store_with_clock();
        store.lock_state();
        store.set("zoom", 2.0).unwrap();

        clock.advance(Duration::from_secs(31));
        assert!(!store.is_locked());
        assert_eq!(number(&store, "zoom"), Some(2.0));

        store.lock_state();
        clock.advance(Duration::from_secs(31));
        assert!(matches!(store.lock_phase(), LockPhase::ForceRecovered { .. }));
    }

    #[test]
    fn test_write_after_timeout_recovers_first() {
        let (store, clock) = store_with_clock();
        store.lock_state();
        store.set("panX", 1.0).unwrap();
        clock.advance(Duration::from_secs(30));

        // The write itself polls the timers, drains, then applies
        store.set("panY", 2.0).unwrap();
        assert!(!store.is_locked());
        assert_eq!(number(&store, "panX"), Some(1.0));
        assert_eq!(number(&store, "panY"), Some(2.0));
    }

    #[test]
    fn test_force_unlock_is_idempotent() {
        let store = StateStore::new();
        store.lock_state();
        store.set("zoom", 2.0).unwrap();
        assert_eq!(store.force_unlock(Some("test")), 1);
        assert_eq!(store.force_unlock(None), 0);
        assert!(!store.is_locked());
        assert_eq!(number(&store, "zoom"), Some(2.0));
    }

    #[test]
    fn test_destroy_makes_writes_no_ops() {
        let store = StateStore::new();
        store.subscribe("zoom", |_, _, _| Ok(()));
        store.destroy();

        assert!(store.is_destroyed());
        assert_eq!(store.listener_count(), 0);
        store.set("zoom", 2.0).unwrap();
        store.lock_state();
        store.unlock_state();
        assert_eq!(store.force_unlock(None), 0);
        assert_eq!(store.get("zoom"), None);
        assert!(!store.is_locked());
        store.destroy();
    }
}
