//! Universe settings persistence
//!
//! A [`SettingsStore`] restores a universe's name and merge mode when the
//! universe is created, and saves them when a setter asks for it. The storage
//! format is up to the implementation; this crate ships an in-memory store and
//! a no-op store.

mod memory;

use std::fmt;
use std::io;

use crate::registry::{MergeMode, Universe};

pub use memory::MemoryStore;

/// Persisted part of a universe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseSettings {
    /// Display name
    pub name: String,
    /// Merge policy
    pub merge_mode: MergeMode,
}

impl UniverseSettings {
    /// Capture the persisted fields of a universe
    pub fn from_universe(universe: &Universe) -> Self {
        Self {
            name: universe.name().to_string(),
            merge_mode: universe.merge_mode(),
        }
    }
}

/// Error type for settings persistence
#[derive(Debug)]
pub enum StoreError {
    /// Backend-specific failure
    Backend(String),
    /// I/O failure
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "Settings backend error: {}", msg),
            StoreError::Io(e) => write!(f, "Settings IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Persistence collaborator injected into the registry
pub trait SettingsStore: Send + Sync {
    /// Populate a freshly created universe from storage, if anything was saved
    fn hydrate(&self, universe: &mut Universe) -> Result<(), StoreError>;

    /// Save the universe's name and merge mode
    fn persist(&self, universe: &Universe) -> Result<(), StoreError>;
}

/// Store that never loads nor saves anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl SettingsStore for NullStore {
    fn hydrate(&self, _universe: &mut Universe) -> Result<(), StoreError> {
        Ok(())
    }

    fn persist(&self, _universe: &Universe) -> Result<(), StoreError> {
        Ok(())
    }
}
