//! Values held in the state record.

use crate::layer::{Layer, LayerId};
use std::collections::HashMap;

pub const CURRENT_TOOL_KEY: &str = "currentTool";
pub const ZOOM_KEY: &str = "zoom";
pub const PAN_X_KEY: &str = "panX";
pub const PAN_Y_KEY: &str = "panY";
pub const LAYERS_KEY: &str = "layers";
pub const SELECTED_LAYER_IDS_KEY: &str = "selectedLayerIds";
pub const IS_DIRTY_KEY: &str = "isDirty";
pub const IS_DRAWING_KEY: &str = "isDrawing";

/// A value stored under a state key.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Ids(Vec<LayerId>),
    Layers(Vec<Layer>),
    Json(serde_json::Value),
}

impl StateValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[LayerId]> {
        match self {
            Self::Ids(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_layers(&self) -> Option<&[Layer]> {
        match self {
            Self::Layers(layers) => Some(layers),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Ids(_) => "ids",
            Self::Layers(_) => "layers",
            Self::Json(_) => "json",
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for StateValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<LayerId>> for StateValue {
    fn from(v: Vec<LayerId>) -> Self {
        Self::Ids(v)
    }
}

impl From<Vec<Layer>> for StateValue {
    fn from(v: Vec<Layer>) -> Self {
        Self::Layers(v)
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// The live keyed state. Callers only ever see copies.
pub type StateRecord = HashMap<String, StateValue>;

/// The record a new store starts with.
pub fn default_record() -> StateRecord {
    let mut record = StateRecord::new();
    record.insert(CURRENT_TOOL_KEY.to_string(), "pointer".into());
    record.insert(ZOOM_KEY.to_string(), StateValue::Number(1.0));
    record.insert(PAN_X_KEY.to_string(), StateValue::Number(0.0));
    record.insert(PAN_Y_KEY.to_string(), StateValue::Number(0.0));
    record.insert(LAYERS_KEY.to_string(), StateValue::Layers(Vec::new()));
    record.insert(SELECTED_LAYER_IDS_KEY.to_string(), StateValue::Ids(Vec::new()));
    record.insert(IS_DIRTY_KEY.to_string(), StateValue::Bool(false));
    record.insert(IS_DRAWING_KEY.to_string(), StateValue::Bool(false));
    record
}

/// An ordered set of key updates applied together.
///
/// Setting a key twice keeps the last value at the first key's position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: Vec<(String, StateValue)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Self::new().with(key, value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn into_entries(self) -> Vec<(String, StateValue)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<StateValue>> FromIterator<(K, V)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut patch = Patch::new();
        for (k, v) in iter {
            patch.insert(k, v);
        }
        patch
    }
}
