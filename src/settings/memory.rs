//! In-memory settings store

use std::collections::HashMap;
use std::sync::Mutex;

use super::{SettingsStore, StoreError, UniverseSettings};
use crate::registry::{Universe, UniverseId};

/// Settings store backed by a map
///
/// Keeps settings for universes that have been destroyed, so a universe that
/// comes back under the same id gets its name and merge mode back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<UniverseId, UniverseSettings>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load settings for a universe
    pub fn insert(&self, id: UniverseId, settings: UniverseSettings) -> Result<(), StoreError> {
        self.lock()?.insert(id, settings);
        Ok(())
    }

    /// Look up saved settings
    pub fn get(&self, id: UniverseId) -> Result<Option<UniverseSettings>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    /// Number of universes with saved settings
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if nothing has been saved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<UniverseId, UniverseSettings>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("settings map lock poisoned".into()))
    }
}

impl SettingsStore for MemoryStore {
    fn hydrate(&self, universe: &mut Universe) -> Result<(), StoreError> {
        if let Some(settings) = self.get(universe.id())? {
            universe.apply_settings(settings);
        }
        Ok(())
    }

    fn persist(&self, universe: &Universe) -> Result<(), StoreError> {
        self.lock()?
            .insert(universe.id(), UniverseSettings::from_universe(universe));
        Ok(())
    }
}
