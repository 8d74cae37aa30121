//! Undo/redo history of document snapshots.
//!
//! History is a linear stack with a current position. Saving after an undo
//! discards every entry above the current one. The stack is capped at
//! `max_history_size` and evicts from the oldest end.
//!
//! A batch collects saves on the side and commits them as a single entry,
//! or restores the document to how it was when the batch started.
//!
//! The engine reads and restores the document through a [`DocumentAccessor`]
//! and reports through [`EditorHooks`]; it has no dependency on the store.

mod compare;
mod entry;
mod host;

pub use compare::{EqualityPolicy, layers_equal};
pub use entry::{HistoryEntry, HistoryEntryInfo, HistoryUiState};
pub use host::{
    Cloner, DocumentAccessor, EditorHooks, NoopHooks, StoreAccessor, StructuralCloner,
};

use crate::config::HistoryConfig;
use crate::layer::Layer;

/// Default number of rows returned by [`HistoryEngine::get_history_entries`].
pub const DEFAULT_HISTORY_LIST_LIMIT: usize = 10;

const INITIAL_STATE_DESCRIPTION: &str = "Initial state";

/// Position last marked as saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavePoint {
    At(Option<usize>),
    /// The saved entry was evicted or discarded.
    Lost,
}

struct Batch {
    description: String,
    start_snapshot: Vec<Layer>,
    changes: Vec<Vec<Layer>>,
}

pub struct HistoryEngine {
    entries: Vec<HistoryEntry>,
    current: Option<usize>,
    save_point: SavePoint,
    max_history_size: usize,
    policy: EqualityPolicy,
    batch: Option<Batch>,
    accessor: Box<dyn DocumentAccessor>,
    hooks: Box<dyn EditorHooks>,
    cloner: Box<dyn Cloner>,
    destroyed: bool,
}

impl std::fmt::Debug for HistoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("len", &self.entries.len())
            .field("current", &self.current)
            .field("save_point", &self.save_point)
            .field("max_history_size", &self.max_history_size)
            .field("batch", &self.batch.as_ref().map(|b| b.changes.len()))
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl HistoryEngine {
    pub fn new(
        config: HistoryConfig,
        accessor: impl DocumentAccessor + 'static,
        hooks: impl EditorHooks + 'static,
    ) -> Self {
        Self::with_cloner(config, accessor, hooks, StructuralCloner)
    }

    /// Build an engine that copies snapshots with `cloner`.
    pub fn with_cloner(
        config: HistoryConfig,
        accessor: impl DocumentAccessor + 'static,
        hooks: impl EditorHooks + 'static,
        cloner: impl Cloner + 'static,
    ) -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            save_point: SavePoint::At(None),
            max_history_size: config.max_history_size.max(1),
            policy: EqualityPolicy::from_config(&config),
            batch: None,
            accessor: Box::new(accessor),
            hooks: Box::new(hooks),
            cloner: Box::new(cloner),
            destroyed: false,
        }
    }

    fn capture(&self) -> Vec<Layer> {
        self.cloner.clone_layers(&self.accessor.layers())
    }

    // --- Recording ---

    /// Record the current document.
    ///
    /// During a batch the snapshot is held back until the batch commits.
    /// Returns false after `destroy`.
    pub fn save_state(&mut self, description: &str) -> bool {
        if self.destroyed {
            return false;
        }
        let snapshot = self.capture();
        if let Some(batch) = self.batch.as_mut() {
            batch.changes.push(snapshot);
            log::debug!(
                "Batch '{}' collected change {}",
                batch.description,
                batch.changes.len()
            );
            return true;
        }
        self.push_entry(HistoryEntry::new(snapshot, description));
        self.hooks.set_dirty(self.has_unsaved_changes());
        self.notify_ui();
        true
    }

    /// Like [`save_state`](Self::save_state), but only if the document differs
    /// from the latest recorded state.
    pub fn save_state_if_changed(&mut self, description: &str) -> bool {
        if self.destroyed {
            return false;
        }
        let live = self.accessor.layers();
        let latest = match &self.batch {
            Some(batch) => batch.changes.last().or(Some(&batch.start_snapshot)),
            None => self
                .current
                .and_then(|c| self.entries.get(c))
                .map(|entry| &entry.snapshot),
        };
        if latest.is_some_and(|snapshot| self.policy.layers_equal(snapshot, &live)) {
            log::debug!("Skipping '{}': document unchanged", description);
            return false;
        }
        self.save_state(description)
    }

    /// Reset history to a single entry for the current document.
    ///
    /// Call once the document has finished loading. The new entry is the
    /// floor that undo stops at and counts as saved.
    pub fn save_initial_state(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        if self.batch.take().is_some() {
            log::warn!("Discarding active batch while saving initial state");
        }
        let snapshot = self.capture();
        self.entries.clear();
        self.entries
            .push(HistoryEntry::new(snapshot, INITIAL_STATE_DESCRIPTION));
        self.current = Some(0);
        self.save_point = SavePoint::At(Some(0));
        self.hooks.set_dirty(false);
        self.notify_ui();
        true
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        let keep = self.current.map_or(0, |c| c + 1);
        if keep < self.entries.len() {
            log::debug!(
                "Discarding {} redo entries",
                self.entries.len() - keep
            );
            self.entries.truncate(keep);
            if let SavePoint::At(Some(saved)) = self.save_point {
                if saved >= keep {
                    self.save_point = SavePoint::Lost;
                }
            }
        }

        self.entries.push(entry);
        self.current = Some(self.entries.len() - 1);

        if self.entries.len() > self.max_history_size {
            let excess = self.entries.len() - self.max_history_size;
            self.drop_oldest(excess);
        }
    }

    /// Remove `count` entries from the oldest end, shifting positions.
    fn drop_oldest(&mut self, count: usize) {
        let count = count.min(self.entries.len());
        if count == 0 {
            return;
        }
        self.entries.drain(..count);
        self.current = if self.entries.is_empty() {
            None
        } else {
            self.current.map(|c| c.saturating_sub(count))
        };
        self.save_point = match self.save_point {
            SavePoint::At(Some(saved)) if saved >= count => SavePoint::At(Some(saved - count)),
            SavePoint::At(Some(_)) => SavePoint::Lost,
            other => other,
        };
    }

    // --- Navigation ---

    pub fn can_undo(&self) -> bool {
        !self.destroyed && matches!(self.current, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        !self.destroyed && matches!(self.current, Some(c) if c + 1 < self.entries.len())
    }

    /// Step back one entry. Returns false at the oldest entry, during a
    /// batch, or if the target entry is missing or corrupted.
    pub fn undo(&mut self) -> bool {
        if !self.navigation_allowed("undo") || !self.can_undo() {
            return false;
        }
        match self.current {
            Some(current) => self.restore_entry(current - 1, "undo"),
            None => false,
        }
    }

    /// Step forward one entry.
    pub fn redo(&mut self) -> bool {
        if !self.navigation_allowed("redo") || !self.can_redo() {
            return false;
        }
        match self.current {
            Some(current) => self.restore_entry(current + 1, "redo"),
            None => false,
        }
    }

    /// Jump back to `index`. Moving forward is redo's job, so only
    /// `index <= current_index` is accepted.
    pub fn revert_to(&mut self, index: usize) -> bool {
        if !self.navigation_allowed("revert") {
            return false;
        }
        match self.current {
            Some(current) if index <= current => self.restore_entry(index, "revert"),
            _ => {
                log::debug!("Cannot revert to entry {} from {:?}", index, self.current);
                false
            }
        }
    }

    fn navigation_allowed(&self, action: &str) -> bool {
        if self.destroyed {
            return false;
        }
        if let Some(batch) = &self.batch {
            log::warn!(
                "Ignoring {} while batch '{}' is active",
                action,
                batch.description
            );
            return false;
        }
        true
    }

    /// Restore the entry at `target` and make it current.
    /// Nothing changes if the entry is missing, corrupted, or cannot be restored.
    fn restore_entry(&mut self, target: usize, action: &str) -> bool {
        let snapshot = match self.entries.get(target) {
            Some(entry) if entry.is_intact() => self.cloner.clone_layers(&entry.snapshot),
            Some(_) => {
                log::error!("History entry {} is corrupted; {} aborted", target, action);
                return false;
            }
            None => {
                log::error!("History entry {} is missing; {} aborted", target, action);
                return false;
            }
        };

        if let Err(e) = self.accessor.restore_layers(snapshot) {
            log::error!("Failed to restore history entry {}: {}", target, e);
            return false;
        }

        self.current = Some(target);
        log::debug!("{} to entry {}", action, target);
        self.after_restore();
        true
    }

    fn after_restore(&self) {
        self.hooks.clear_selection();
        self.hooks.render();
        self.hooks.set_dirty(self.has_unsaved_changes());
        self.notify_ui();
    }

    // --- Batches ---

    /// Start collecting saves into one entry. A second call while a batch is
    /// active is ignored.
    pub fn start_batch(&mut self, description: &str) -> bool {
        if self.destroyed {
            return false;
        }
        if let Some(batch) = &self.batch {
            log::warn!(
                "Batch '{}' already active; ignoring start of '{}'",
                batch.description,
                description
            );
            return false;
        }
        let start_snapshot = self.capture();
        self.batch = Some(Batch {
            description: description.to_string(),
            start_snapshot,
            changes: Vec::new(),
        });
        log::debug!("Started batch '{}'", description);
        true
    }

    /// Record the batch's final state as one entry.
    ///
    /// A batch with no saves leaves history untouched. Returns whether an
    /// entry was added.
    pub fn commit_batch(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(mut batch) = self.batch.take() else {
            return false;
        };
        let Some(last) = batch.changes.pop() else {
            log::debug!("Batch '{}' had no changes", batch.description);
            return false;
        };
        log::debug!(
            "Committing batch '{}' ({} changes)",
            batch.description,
            batch.changes.len() + 1
        );
        self.push_entry(HistoryEntry::new(last, batch.description));
        self.hooks.set_dirty(self.has_unsaved_changes());
        self.notify_ui();
        true
    }

    /// Alias of [`commit_batch`](Self::commit_batch).
    pub fn end_batch(&mut self) -> bool {
        self.commit_batch()
    }

    /// Drop the batch and restore the document to how it was when the batch started.
    pub fn cancel_batch(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(batch) = self.batch.take() else {
            return false;
        };
        log::debug!(
            "Cancelling batch '{}' ({} changes)",
            batch.description,
            batch.changes.len()
        );
        let snapshot = self.cloner.clone_layers(&batch.start_snapshot);
        if let Err(e) = self.accessor.restore_layers(snapshot) {
            log::error!(
                "Failed to restore document for cancelled batch '{}': {}; batch kept",
                batch.description,
                e
            );
            self.batch = Some(batch);
            return false;
        }
        self.after_restore();
        true
    }

    pub fn is_batch_active(&self) -> bool {
        self.batch.is_some()
    }

    /// Saves collected by the active batch.
    pub fn batch_len(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.changes.len())
    }

    // --- Size management ---

    /// Evict old entries down to half of `max_history_size` once history is
    /// longer than that. The current entry is never evicted.
    /// Returns the number of entries removed.
    pub fn compress_history(&mut self) -> usize {
        if self.destroyed {
            return 0;
        }
        let keep = (self.max_history_size / 2).max(1);
        if self.entries.len() <= keep {
            return 0;
        }
        let excess = (self.entries.len() - keep).min(self.current.unwrap_or(0));
        if excess > 0 {
            self.drop_oldest(excess);
            log::debug!(
                "Compressed history by {} entries to {}",
                excess,
                self.entries.len()
            );
            self.notify_ui();
        }
        excess
    }

    /// Change the cap (minimum 1), trimming the oldest entries if needed.
    ///
    /// If the current entry is trimmed, the oldest remaining entry becomes
    /// current and is restored to the document.
    pub fn set_max_history_steps(&mut self, steps: usize) {
        if self.destroyed {
            return;
        }
        self.max_history_size = steps.max(1);
        if self.entries.len() <= self.max_history_size {
            return;
        }
        let excess = self.entries.len() - self.max_history_size;
        let current_evicted = self.current.is_some_and(|c| c < excess);
        self.drop_oldest(excess);
        log::debug!(
            "Trimmed {} entries to fit max history size {}",
            excess,
            self.max_history_size
        );

        if current_evicted {
            log::warn!("Current history entry was trimmed; restoring the oldest remaining entry");
            if self.restore_entry(0, "trim") {
                return;
            }
        }
        self.notify_ui();
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Approximate heap held by snapshots, measured as serialized JSON.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| serde_json::to_vec(&entry.snapshot).map_or(0, |bytes| bytes.len()))
            .sum()
    }

    // --- Save checkpoint ---

    /// Mark the current entry as the saved document.
    pub fn mark_as_saved(&mut self) {
        if self.destroyed {
            return;
        }
        self.save_point = SavePoint::At(self.current);
        self.hooks.set_dirty(false);
        self.notify_ui();
    }

    /// True if the current entry is not the one last marked as saved. With no
    /// history, true whenever the document has layers.
    pub fn has_unsaved_changes(&self) -> bool {
        if self.destroyed {
            return false;
        }
        if self.entries.is_empty() {
            return !self.accessor.layers().is_empty();
        }
        self.save_point != SavePoint::At(self.current)
    }

    // --- Inspection ---

    /// The most recent `limit` entries, oldest first.
    pub fn get_history_entries(&self, limit: usize) -> Vec<HistoryEntryInfo> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .map(|(index, entry)| HistoryEntryInfo {
                index,
                description: entry.description.clone(),
                timestamp: entry.timestamp,
                is_current: self.current == Some(index),
                can_revert_to: self.current.is_some_and(|c| index <= c),
            })
            .collect()
    }

    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Position of the current entry, `None` when history is empty.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Description of the entry undo would step back from.
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.current
            .and_then(|c| self.entries.get(c))
            .map(|e| e.description.as_str())
    }

    /// Description of the entry redo would step forward to.
    pub fn redo_description(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.current
            .and_then(|c| self.entries.get(c + 1))
            .map(|e| e.description.as_str())
    }

    pub fn ui_state(&self) -> HistoryUiState {
        HistoryUiState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_description: self.undo_description().map(str::to_string),
            redo_description: self.redo_description().map(str::to_string),
        }
    }

    fn notify_ui(&self) {
        self.hooks.history_changed(&self.ui_state());
    }

    pub fn layers_equal(&self, a: &[Layer], b: &[Layer]) -> bool {
        self.policy.layers_equal(a, b)
    }

    pub fn policy(&self) -> &EqualityPolicy {
        &self.policy
    }

    // --- Lifecycle ---

    /// Drop all entries and any active batch.
    pub fn clear(&mut self) {
        if self.destroyed {
            return;
        }
        self.entries.clear();
        self.current = None;
        self.save_point = SavePoint::At(None);
        self.batch = None;
        self.notify_ui();
    }

    /// Release history. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.entries = Vec::new();
        self.current = None;
        self.batch = None;
        self.destroyed = true;
        log::debug!("History destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
