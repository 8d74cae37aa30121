//! Layer and selection operations.
//!
//! Every operation here goes through `update`/`atomic` on the `layers` and
//! `selectedLayerIds` keys, so it is queued while the store is locked and
//! notifies like any other write. Operations return whether anything
//! changed. While locked that answer is computed against the current state;
//! the edit itself is re-run against the state at drain time.

use super::{
    IS_DIRTY_KEY, LAYERS_KEY, Patch, SELECTED_LAYER_IDS_KEY, StateRecord, StateStore, StateValue,
};
use crate::layer::{self, Layer, LayerId};

fn layers_of(state: &StateRecord) -> Vec<Layer> {
    state
        .get(LAYERS_KEY)
        .and_then(StateValue::as_layers)
        .map(<[Layer]>::to_vec)
        .unwrap_or_default()
}

fn selection_of(state: &StateRecord) -> Vec<LayerId> {
    state
        .get(SELECTED_LAYER_IDS_KEY)
        .and_then(StateValue::as_ids)
        .map(<[LayerId]>::to_vec)
        .unwrap_or_default()
}

/// What an edit is allowed to write back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Selection,
    Document,
}

fn edit_patch(scope: Scope, layers: Vec<Layer>, selection: Vec<LayerId>) -> Patch {
    let patch = Patch::single(SELECTED_LAYER_IDS_KEY, selection);
    match scope {
        Scope::Selection => patch,
        Scope::Document => patch.with(LAYERS_KEY, layers).with(IS_DIRTY_KEY, true),
    }
}

impl StateStore {
    fn edit_layers<F>(&self, scope: Scope, edit: F) -> bool
    where
        F: Fn(&mut Vec<Layer>, &mut Vec<LayerId>) -> bool + 'static,
    {
        if self.is_destroyed() {
            return false;
        }
        let state = self.get_state();
        let mut layers = layers_of(&state);
        let mut selection = selection_of(&state);
        if !edit(&mut layers, &mut selection) {
            return false;
        }

        let result = if self.is_locked() {
            self.atomic(move |state| {
                let mut layers = layers_of(state);
                let mut selection = selection_of(state);
                edit(&mut layers, &mut selection).then(|| edit_patch(scope, layers, selection))
            })
        } else {
            self.update(edit_patch(scope, layers, selection))
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Layer operation failed: {}", e);
                false
            }
        }
    }

    /// Copy of the layer list, topmost first.
    pub fn get_layers(&self) -> Vec<Layer> {
        self.inner
            .borrow()
            .record
            .get(LAYERS_KEY)
            .and_then(StateValue::as_layers)
            .map(<[Layer]>::to_vec)
            .unwrap_or_default()
    }

    pub fn get_layer(&self, id: &str) -> Option<Layer> {
        self.inner
            .borrow()
            .record
            .get(LAYERS_KEY)
            .and_then(StateValue::as_layers)
            .and_then(|layers| layers.iter().find(|l| l.id == id).cloned())
    }

    /// Insert a layer at the top of the list.
    ///
    /// A layer without an id gets a generated one. If the layer names an
    /// existing group as its parent it is also listed among that group's
    /// children. Returns `None` if a layer with the same id already exists.
    pub fn add_layer(&self, mut layer: Layer) -> Option<LayerId> {
        if layer.id.is_empty() {
            layer.id = Layer::generate_id();
        }
        let id = layer.id.clone();
        let added = self.edit_layers(Scope::Document, move |layers, _| {
            if layer::find_index(layers, &layer.id).is_some() {
                log::debug!("Layer {} already exists", layer.id);
                return false;
            }
            if let Some(group) = layer.parent_group.as_deref() {
                if let Some(parent) = layers.iter_mut().find(|l| l.id == group && l.is_group()) {
                    if !parent.children.contains(&layer.id) {
                        parent.children.push(layer.id.clone());
                    }
                }
            }
            layers.insert(0, layer.clone());
            true
        });
        added.then_some(id)
    }

    /// Remove a layer. Removing a group removes everything nested in it.
    pub fn remove_layer(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, selection| {
            let removed = layer::remove_block(layers, &id);
            if removed.is_empty() {
                return false;
            }
            selection.retain(|s| !removed.contains(s));
            true
        })
    }

    /// Edit one layer in place. The layer's id cannot be changed this way.
    pub fn update_layer<F>(&self, id: &str, edit: F) -> bool
    where
        F: Fn(&mut Layer) + 'static,
    {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, _| {
            let Some(target) = layers.iter_mut().find(|l| l.id == id) else {
                return false;
            };
            let before = target.clone();
            edit(target);
            target.id.clone_from(&before.id);
            *target != before
        })
    }

    /// Move `dragged` (with its group members) next to `target`.
    pub fn reorder_layer(&self, dragged: &str, target: &str, insert_after: bool) -> bool {
        let dragged = dragged.to_string();
        let target = target.to_string();
        self.edit_layers(Scope::Document, move |layers, _| {
            layer::reorder(layers, &dragged, &target, insert_after)
        })
    }

    pub fn move_layer_up(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, _| layer::move_up(layers, &id))
    }

    pub fn move_layer_down(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, _| layer::move_down(layers, &id))
    }

    pub fn bring_to_front(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, _| layer::bring_to_front(layers, &id))
    }

    pub fn send_to_back(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Document, move |layers, _| layer::send_to_back(layers, &id))
    }

    // --- Selection ---

    /// Select a layer, replacing the selection unless `additive`.
    pub fn select_layer(&self, id: &str, additive: bool) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Selection, move |layers, selection| {
            if layer::find_index(layers, &id).is_none() {
                return false;
            }
            if additive {
                if selection.contains(&id) {
                    return false;
                }
                selection.push(id.clone());
            } else {
                if selection.len() == 1 && selection[0] == id {
                    return false;
                }
                *selection = vec![id.clone()];
            }
            true
        })
    }

    pub fn deselect_layer(&self, id: &str) -> bool {
        let id = id.to_string();
        self.edit_layers(Scope::Selection, move |_, selection| {
            let before = selection.len();
            selection.retain(|s| *s != id);
            selection.len() != before
        })
    }

    pub fn clear_selection(&self) -> bool {
        self.edit_layers(Scope::Selection, |_, selection| {
            if selection.is_empty() {
                return false;
            }
            selection.clear();
            true
        })
    }

    /// Select every layer, in list order.
    pub fn select_all(&self) -> bool {
        self.edit_layers(Scope::Selection, |layers, selection| {
            let all: Vec<LayerId> = layers.iter().map(|l| l.id.clone()).collect();
            if *selection == all {
                return false;
            }
            *selection = all;
            true
        })
    }

    /// Replace the selection. Unknown and repeated ids are dropped.
    pub fn set_selected_layer_ids(&self, ids: Vec<LayerId>) -> bool {
        self.edit_layers(Scope::Selection, move |layers, selection| {
            let mut next: Vec<LayerId> = Vec::with_capacity(ids.len());
            for id in &ids {
                if layer::find_index(layers, id).is_some() && !next.contains(id) {
                    next.push(id.clone());
                }
            }
            if *selection == next {
                return false;
            }
            *selection = next;
            true
        })
    }

    pub fn get_selected_layer_ids(&self) -> Vec<LayerId> {
        self.inner
            .borrow()
            .record
            .get(SELECTED_LAYER_IDS_KEY)
            .and_then(StateValue::as_ids)
            .map(<[LayerId]>::to_vec)
            .unwrap_or_default()
    }

    /// Selected layers, in selection order.
    pub fn get_selected_layers(&self) -> Vec<Layer> {
        let inner = self.inner.borrow();
        let layers = inner
            .record
            .get(LAYERS_KEY)
            .and_then(StateValue::as_layers)
            .unwrap_or_default();
        inner
            .record
            .get(SELECTED_LAYER_IDS_KEY)
            .and_then(StateValue::as_ids)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| layers.iter().find(|l| l.id == *id).cloned())
            .collect()
    }

    // --- Dirty flag ---

    pub fn mark_dirty(&self) {
        if let Err(e) = self.set(IS_DIRTY_KEY, true) {
            log::error!("Failed to mark document dirty: {}", e);
        }
    }

    pub fn mark_clean(&self) {
        if let Err(e) = self.set(IS_DIRTY_KEY, false) {
            log::error!("Failed to mark document clean: {}", e);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.get(IS_DIRTY_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
