pub mod local;

pub use local::{FileDraftStorage, MemoryDraftStorage};

/// Key/value persistence for the editor's local draft.
/// Implementations: FileDraftStorage (JSON file), MemoryDraftStorage (in-process).
pub trait DraftStorage: Send + Sync {
    /// Read a value; missing keys are `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode drafts: {0}")]
    Serialize(#[from] serde_json::Error),
}
