//! Listener registry.

use super::value::StateValue;
use crate::error::CallbackResult;
use std::collections::HashMap;
use std::rc::Rc;

/// Key that subscribes to every change.
pub const WILDCARD_KEY: &str = "*";

/// Called with `(new_value, old_value, key)`.
pub type KeyListener = Rc<dyn Fn(&StateValue, &StateValue, &str) -> CallbackResult>;

/// Called with `(key, new_value, old_value)`.
pub type WildcardListener = Rc<dyn Fn(&str, &StateValue, &StateValue) -> CallbackResult>;

pub(crate) type ListenerId = u64;

/// Which list a subscription lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListenerSlot {
    Key(String),
    Wildcard,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: ListenerId,
    keyed: HashMap<String, Vec<(ListenerId, KeyListener)>>,
    wildcard: Vec<(ListenerId, WildcardListener)>,
}

impl ListenerRegistry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn add_key(&mut self, key: &str, listener: KeyListener) -> ListenerId {
        let id = self.allocate();
        self.keyed
            .entry(key.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    pub(crate) fn add_wildcard(&mut self, listener: WildcardListener) -> ListenerId {
        let id = self.allocate();
        self.wildcard.push((id, listener));
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub(crate) fn remove(&mut self, slot: &ListenerSlot, id: ListenerId) {
        match slot {
            ListenerSlot::Key(key) => {
                if let Some(list) = self.keyed.get_mut(key) {
                    list.retain(|(lid, _)| *lid != id);
                    if list.is_empty() {
                        self.keyed.remove(key);
                    }
                }
            }
            ListenerSlot::Wildcard => self.wildcard.retain(|(lid, _)| *lid != id),
        }
    }

    /// Listeners for a key, as a snapshot that outlives the registry borrow.
    pub(crate) fn for_key(&self, key: &str) -> Vec<KeyListener> {
        self.keyed
            .get(key)
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn wildcards(&self) -> Vec<WildcardListener> {
        self.wildcard.iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.keyed.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    pub(crate) fn clear(&mut self) {
        self.keyed.clear();
        self.wildcard.clear();
    }
}
