use crate::clock::SystemTime;
use crate::layer::Layer;
use std::collections::HashSet;

/// One recorded document state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: Vec<Layer>,
    pub description: String,
    pub timestamp: SystemTime,
}

impl HistoryEntry {
    pub fn new(snapshot: Vec<Layer>, description: impl Into<String>) -> Self {
        Self {
            snapshot,
            description: description.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// False if the snapshot has an empty or repeated layer id.
    pub fn is_intact(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.snapshot.len());
        self.snapshot
            .iter()
            .all(|layer| !layer.id.is_empty() && seen.insert(layer.id.as_str()))
    }
}

/// Row of the history palette.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntryInfo {
    pub index: usize,
    pub description: String,
    pub timestamp: SystemTime,
    pub is_current: bool,
    pub can_revert_to: bool,
}

/// What the undo and redo buttons should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryUiState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}
