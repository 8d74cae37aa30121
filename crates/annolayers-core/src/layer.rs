//! Annotation layers and layer-list ordering.
//!
//! Layer lists are ordered top to bottom: index 0 is the topmost layer.
//! A group layer lists its members in `children`, and each member names the
//! group in `parent_group`. A group and all of its descendants form a *block*
//! that reorder operations move as one contiguous run.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique layer identifier.
pub type LayerId = String;

/// Kind of annotation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Rectangle,
    Circle,
    Ellipse,
    Polygon,
    Star,
    Line,
    Arrow,
    Text,
    Textbox,
    Path,
    Image,
    Highlight,
    Blur,
    Group,
}

/// A large, immutable layer field such as embedded image data or an SVG path.
///
/// Cloning a `Payload` shares the underlying buffer, so snapshots stay cheap
/// and two snapshots taken without an intervening edit hold the same buffer.
/// `==` compares content; [`Payload::ptr_eq`] compares identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(Arc<str>);

impl Payload {
    pub fn new(data: impl Into<Arc<str>>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both payloads share one buffer.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

impl From<&str> for Payload {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

impl From<String> for Payload {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = String::deserialize(deserializer)?;
        Ok(Self::new(data))
    }
}

fn default_visible() -> bool {
    true
}

/// A single annotation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Enclosing group, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group: Option<LayerId>,
    /// Member ids (groups only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerId>,
    /// Geometry and style properties (x, y, width, stroke, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    /// Large opaque fields (image `src`, vector `path`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payloads: BTreeMap<String, Payload>,
}

impl Layer {
    /// Create a layer with a fresh id.
    pub fn new(kind: LayerKind) -> Self {
        Self::with_id(Self::generate_id(), kind)
    }

    /// Create a layer with a specific id.
    pub fn with_id(id: impl Into<LayerId>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            visible: true,
            locked: false,
            parent_group: None,
            children: Vec::new(),
            props: Map::new(),
            payloads: BTreeMap::new(),
        }
    }

    /// Create a group layer over the given member ids.
    pub fn group(id: impl Into<LayerId>, children: Vec<LayerId>) -> Self {
        let mut layer = Self::with_id(id, LayerKind::Group);
        layer.children = children;
        layer
    }

    pub fn generate_id() -> LayerId {
        format!("layer_{}", Uuid::new_v4().simple())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, payload: impl Into<Payload>) -> Self {
        self.payloads.insert(key.into(), payload.into());
        self
    }

    pub fn in_group(mut self, group: impl Into<LayerId>) -> Self {
        self.parent_group = Some(group.into());
        self
    }

    pub fn is_group(&self) -> bool {
        self.kind == LayerKind::Group
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn payload(&self, key: &str) -> Option<&Payload> {
        self.payloads.get(key)
    }
}

/// Position of a layer in the list.
pub fn find_index(layers: &[Layer], id: &str) -> Option<usize> {
    layers.iter().position(|l| l.id == id)
}

/// Ids of every layer nested under `id`, at any depth.
pub fn descendants(layers: &[Layer], id: &str) -> HashSet<LayerId> {
    let mut found: HashSet<LayerId> = HashSet::new();
    let mut frontier: Vec<LayerId> = vec![id.to_string()];

    while let Some(current) = frontier.pop() {
        let listed = layers
            .iter()
            .find(|l| l.id == current)
            .map(|l| l.children.clone())
            .unwrap_or_default();
        let members = layers
            .iter()
            .filter(|l| l.parent_group.as_deref() == Some(current.as_str()))
            .map(|l| l.id.clone());

        for child in listed.into_iter().chain(members) {
            if child != id && found.insert(child.clone()) {
                frontier.push(child);
            }
        }
    }
    found
}

/// Indices of a layer and its descendants, ascending.
/// Empty if the layer does not exist.
pub fn block_indices(layers: &[Layer], id: &str) -> Vec<usize> {
    if find_index(layers, id).is_none() {
        return Vec::new();
    }
    let nested = descendants(layers, id);
    layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.id == id || nested.contains(&l.id))
        .map(|(i, _)| i)
        .collect()
}

fn ids(layers: &[Layer]) -> Vec<&str> {
    layers.iter().map(|l| l.id.as_str()).collect()
}

/// Move `dragged` (with its block) immediately before or after `target`.
///
/// Inserting after a group places the block after the group's own block.
/// Returns false if either layer is missing, `target` lies inside the dragged
/// block, or the order would not change.
pub fn reorder(layers: &mut Vec<Layer>, dragged: &str, target: &str, insert_after: bool) -> bool {
    if dragged == target {
        return false;
    }
    let block = block_indices(layers, dragged);
    if block.is_empty() {
        return false;
    }
    let Some(target_index) = find_index(layers, target) else {
        return false;
    };
    if block.contains(&target_index) {
        return false;
    }

    let before: Vec<LayerId> = ids(layers).into_iter().map(str::to_string).collect();

    let mut moved = Vec::with_capacity(block.len());
    for &index in block.iter().rev() {
        moved.push(layers.remove(index));
    }
    moved.reverse();

    let insert_at = if insert_after {
        block_indices(layers, target)
            .last()
            .map(|&last| last + 1)
            .unwrap_or(layers.len())
    } else {
        find_index(layers, target).unwrap_or(0)
    };
    layers.splice(insert_at..insert_at, moved);

    ids(layers) != before.iter().map(String::as_str).collect::<Vec<_>>()
}

/// Layers sharing `id`'s parent group, in list order.
fn siblings(layers: &[Layer], id: &str) -> Vec<LayerId> {
    let Some(layer) = layers.iter().find(|l| l.id == id) else {
        return Vec::new();
    };
    let parent = layer.parent_group.clone();
    layers
        .iter()
        .filter(|l| l.parent_group == parent)
        .map(|l| l.id.clone())
        .collect()
}

/// Swap a layer with the sibling above it.
pub fn move_up(layers: &mut Vec<Layer>, id: &str) -> bool {
    let siblings = siblings(layers, id);
    match siblings.iter().position(|s| s == id) {
        Some(pos) if pos > 0 => reorder(layers, id, &siblings[pos - 1], false),
        _ => false,
    }
}

/// Swap a layer with the sibling below it.
pub fn move_down(layers: &mut Vec<Layer>, id: &str) -> bool {
    let siblings = siblings(layers, id);
    match siblings.iter().position(|s| s == id) {
        Some(pos) if pos + 1 < siblings.len() => reorder(layers, id, &siblings[pos + 1], true),
        _ => false,
    }
}

/// Move a layer above all of its siblings.
pub fn bring_to_front(layers: &mut Vec<Layer>, id: &str) -> bool {
    let siblings = siblings(layers, id);
    match siblings.first() {
        Some(first) if first != id => reorder(layers, id, first, false),
        _ => false,
    }
}

/// Move a layer below all of its siblings.
pub fn send_to_back(layers: &mut Vec<Layer>, id: &str) -> bool {
    let siblings = siblings(layers, id);
    match siblings.last() {
        Some(last) if last != id => reorder(layers, id, last, true),
        _ => false,
    }
}

/// Remove a layer and its descendants, detaching it from its parent group.
/// Returns the removed ids, empty if the layer does not exist.
pub fn remove_block(layers: &mut Vec<Layer>, id: &str) -> Vec<LayerId> {
    let block = block_indices(layers, id);
    if block.is_empty() {
        return Vec::new();
    }
    let mut removed = Vec::with_capacity(block.len());
    for &index in block.iter().rev() {
        removed.push(layers.remove(index).id);
    }
    removed.reverse();

    for layer in layers.iter_mut().filter(|l| l.is_group()) {
        layer.children.retain(|child| child != id);
    }
    removed
}
