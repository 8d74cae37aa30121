//! Annolayers Core Library
//!
//! State store and undo/redo history for the annolayers annotation editor.

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod layer;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EditorConfig, HistoryConfig, StoreConfig};
pub use error::{CallbackError, CallbackResult, ConfigError, StoreError, StoreResult};
pub use history::{
    Cloner, DocumentAccessor, EditorHooks, EqualityPolicy, HistoryEngine, HistoryEntry,
    HistoryEntryInfo, HistoryUiState, NoopHooks, StoreAccessor, StructuralCloner, layers_equal,
};
pub use layer::{Layer, LayerId, LayerKind, Payload};
pub use state::{LockPhase, Patch, StateRecord, StateStore, StateValue, Subscription};
