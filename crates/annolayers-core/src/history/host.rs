//! Host seams for the history engine.

use super::HistoryUiState;
use crate::error::{CallbackResult, StoreError};
use crate::layer::Layer;
use crate::state::{LAYERS_KEY, StateStore};

/// Reads and replaces the live document.
///
/// Implemented once per host and chosen when the engine is built.
pub trait DocumentAccessor {
    /// Current layers, topmost first.
    fn layers(&self) -> Vec<Layer>;

    /// Replace the document with a restored snapshot.
    ///
    /// Return `Err` unless the document is replaced before this returns.
    fn restore_layers(&self, layers: Vec<Layer>) -> CallbackResult;
}

/// Notifications driven by history operations. Every method defaults to a no-op.
pub trait EditorHooks {
    /// Redraw after the document was replaced.
    fn render(&self) {}

    /// Drop the selection after a restore, since selected layers may be gone.
    fn clear_selection(&self) {}

    /// Whether the document now differs from the last saved position.
    fn set_dirty(&self, _dirty: bool) {}

    /// Undo/redo affordances changed.
    fn history_changed(&self, _state: &HistoryUiState) {}
}

/// Hooks that ignore every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl EditorHooks for NoopHooks {}

/// Snapshot copy strategy.
///
/// Whatever it returns must not share mutable structure with its input.
pub trait Cloner {
    fn clone_layers(&self, layers: &[Layer]) -> Vec<Layer>;
}

/// Field-by-field clone. Payload buffers are immutable and stay shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralCloner;

impl Cloner for StructuralCloner {
    fn clone_layers(&self, layers: &[Layer]) -> Vec<Layer> {
        layers.to_vec()
    }
}

/// Reads and restores the document through a [`StateStore`].
///
/// Restores go through `set` and notify `layers` listeners like any other
/// write. A restore while the store is locked is refused, since a queued
/// write may be dropped before it applies.
#[derive(Debug, Clone)]
pub struct StoreAccessor {
    store: StateStore,
}

impl StoreAccessor {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

impl DocumentAccessor for StoreAccessor {
    fn layers(&self) -> Vec<Layer> {
        self.store.get_layers()
    }

    fn restore_layers(&self, layers: Vec<Layer>) -> CallbackResult {
        if self.store.is_locked() {
            return Err(StoreError::Locked.into());
        }
        self.store.set(LAYERS_KEY, layers)?;
        Ok(())
    }
}

impl EditorHooks for StoreAccessor {
    fn clear_selection(&self) {
        self.store.clear_selection();
    }

    fn set_dirty(&self, dirty: bool) {
        if dirty {
            self.store.mark_dirty();
        } else {
            self.store.mark_clean();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKind, Payload};

    #[test]
    fn test_structural_clone_is_independent() {
        let live = vec![
            Layer::with_id("a", LayerKind::Image)
                .with_prop("x", 5)
                .with_payload("src", Payload::new("blob")),
        ];
        let mut copy = StructuralCloner.clone_layers(&live);
        copy[0].set_prop("x", 99);
        assert_eq!(live[0].prop("x"), Some(&serde_json::json!(5)));
        assert!(copy[0].payload("src").unwrap().ptr_eq(live[0].payload("src").unwrap()));
    }

    #[test]
    fn test_store_accessor_round_trips_layers() {
        let store = StateStore::new();
        let accessor = StoreAccessor::new(store.clone());
        accessor
            .restore_layers(vec![Layer::with_id("a", LayerKind::Text)])
            .unwrap();
        assert_eq!(store.get_layers().len(), 1);
        assert_eq!(accessor.layers()[0].id, "a");

        store.select_layer("a", false);
        accessor.clear_selection();
        assert!(store.get_selected_layer_ids().is_empty());

        accessor.set_dirty(true);
        assert!(store.is_dirty());
        accessor.set_dirty(false);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_store_accessor_refuses_restore_while_locked() {
        let store = StateStore::new();
        let accessor = StoreAccessor::new(store.clone());
        store.lock_state();

        let result = accessor.restore_layers(vec![Layer::with_id("a", LayerKind::Text)]);
        assert!(result.is_err());
        assert_eq!(store.pending_len(), 0);

        store.unlock_state();
        assert!(store.get_layers().is_empty());
    }
}
