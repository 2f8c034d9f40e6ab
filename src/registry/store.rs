//! Universe registry implementation
//!
//! The central registry that owns every live universe, the port table, and
//! the collaborators universes use to deliver data.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::client::Transport;
use crate::port::{Port, PortId, PortTable};
use crate::settings::SettingsStore;
use crate::stats::RegistryStats;

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::fanout::FanoutReport;
use super::frame::UniverseId;
use super::handle::UniverseMut;
use super::universe::{Universe, UniverseStats};

/// Registry shared between the event loop and the sweep task
pub type SharedRegistry = Arc<Mutex<UniverseRegistry>>;

/// Result of patching a port to a universe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The port was already patched to the target universe
    AlreadyPatched,
    /// The port is now patched to the target universe
    Patched {
        /// Universe the port was taken from, if any
        donor: Option<UniverseId>,
        /// Whether the donor was left unused and destroyed
        donor_destroyed: bool,
    },
}

/// Result of unpatching a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unpatched {
    /// Universe the port was removed from
    pub universe: UniverseId,
    /// Whether that universe has no ports and no clients left
    pub now_unused: bool,
}

/// Central registry for all live universes
///
/// This is the context object of the daemon core: it is built once at
/// startup with its transport and settings store, and every operation goes
/// through it. It is not internally synchronised; drive it from one event
/// loop, or share it as a [`SharedRegistry`].
pub struct UniverseRegistry {
    /// Live universes, ordered by id
    universes: BTreeMap<UniverseId, Universe>,

    /// Ports known to the registry
    ports: PortTable,

    /// Outbound message sink for client fan-out
    transport: Arc<dyn Transport>,

    /// Universe settings persistence
    store: Arc<dyn SettingsStore>,

    stats: RegistryStats,

    config: RegistryConfig,
}

impl UniverseRegistry {
    /// Create a new registry with default configuration
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SettingsStore>) -> Self {
        Self::with_config(RegistryConfig::default(), transport, store)
    }

    /// Create a new registry with custom configuration
    pub fn with_config(
        config: RegistryConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            universes: BTreeMap::new(),
            ports: PortTable::new(),
            transport,
            store,
            stats: RegistryStats::new(),
            config,
        }
    }

    /// Wrap the registry for sharing with the sweep task
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the registry counters
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Add a port to the port table
    ///
    /// The port starts unpatched; any back-reference it carries is cleared.
    pub fn register_port(&mut self, port: Arc<dyn Port>) -> Result<(), RegistryError> {
        let id = port.id();
        if self.ports.contains_key(&id) {
            return Err(RegistryError::PortAlreadyRegistered(id));
        }

        if let Some(stale) = port.universe() {
            tracing::debug!(port = %id, universe = %stale, "Clearing back-reference of new port");
            port.set_universe(None);
        }

        self.ports.insert(id, port);
        tracing::debug!(port = %id, "Port registered");
        Ok(())
    }

    /// Remove a port from the port table, unpatching it first
    ///
    /// The universe it was patched to is reported but not destroyed, even if
    /// it is left unused.
    pub fn unregister_port(&mut self, port: PortId) -> Result<Option<Unpatched>, RegistryError> {
        let unpatched = self.unpatch_port(port)?;
        self.ports.remove(&port);

        tracing::debug!(port = %port, "Port unregistered");
        Ok(unpatched)
    }

    /// Look up a registered port
    pub fn port(&self, port: PortId) -> Option<&Arc<dyn Port>> {
        self.ports.get(&port)
    }

    /// Look up a universe
    pub fn get(&self, id: UniverseId) -> Option<&Universe> {
        self.universes.get(&id)
    }

    /// Look up a universe for modification
    pub fn get_mut(&mut self, id: UniverseId) -> Option<UniverseMut<'_>> {
        let Self {
            universes,
            ports,
            transport,
            store,
            stats,
            config,
        } = self;

        let universe = universes.get_mut(&id)?;
        Some(UniverseMut::new(
            universe,
            ports,
            &**transport,
            &**store,
            stats,
            config.slow_target_threshold,
        ))
    }

    /// Look up a universe, creating it if it does not exist
    ///
    /// A new universe starts with default state and is then hydrated from the
    /// settings store. A hydration failure is logged and the defaults are
    /// kept. Fails only if the configured universe limit is reached, in which
    /// case nothing is inserted.
    pub fn get_or_create(&mut self, id: UniverseId) -> Result<UniverseMut<'_>, RegistryError> {
        if !self.universes.contains_key(&id) {
            let limit = self.config.max_universes;
            if limit > 0 && self.universes.len() >= limit {
                tracing::warn!(universe = %id, limit = limit, "Universe limit reached");
                return Err(RegistryError::CapacityExceeded { limit });
            }

            let mut universe = Universe::new(id);
            if let Err(e) = self.store.hydrate(&mut universe) {
                tracing::warn!(universe = %id, error = %e, "Failed to load universe settings");
            }

            tracing::info!(
                universe = %id,
                name = universe.name(),
                merge_mode = %universe.merge_mode(),
                "Universe created"
            );

            self.universes.insert(id, universe);
            self.stats.universes_created += 1;
        }

        self.get_mut(id).ok_or(RegistryError::UniverseNotFound(id))
    }

    /// Snapshot of all live universes, in id order
    pub fn list(&self) -> Vec<&Universe> {
        self.universes.values().collect()
    }

    /// Ids of all live universes, in order
    pub fn ids(&self) -> Vec<UniverseId> {
        self.universes.keys().copied().collect()
    }

    /// Get total number of live universes
    pub fn count(&self) -> usize {
        self.universes.len()
    }

    /// Get statistics for one universe
    pub fn universe_stats(&self, id: UniverseId) -> Option<UniverseStats> {
        self.universes.get(&id).map(Universe::stats)
    }

    /// Patch a port to a universe
    ///
    /// A port belongs to at most one universe. If it is patched elsewhere it
    /// is unpatched first, and the donor universe is destroyed right away if
    /// that leaves it with no ports and no clients.
    pub fn add_port(
        &mut self,
        id: UniverseId,
        port_id: PortId,
    ) -> Result<PatchOutcome, RegistryError> {
        let port = self
            .ports
            .get(&port_id)
            .cloned()
            .ok_or(RegistryError::PortNotRegistered(port_id))?;

        if !self.universes.contains_key(&id) {
            return Err(RegistryError::UniverseNotFound(id));
        }

        if port.universe() == Some(id) {
            return Ok(PatchOutcome::AlreadyPatched);
        }

        let mut donor = None;
        let mut donor_destroyed = false;

        if let Some(unpatched) = self.unpatch_port(port_id)? {
            donor = Some(unpatched.universe);
            if unpatched.now_unused {
                donor_destroyed = self.destroy(unpatched.universe);
            }
        }

        let universe = self
            .universes
            .get_mut(&id)
            .ok_or(RegistryError::UniverseNotFound(id))?;
        universe.attach_port(port_id);
        port.set_universe(Some(id));

        tracing::info!(port = %port_id, universe = %id, "Patched port to universe");

        Ok(PatchOutcome::Patched {
            donor,
            donor_destroyed,
        })
    }

    /// Unpatch a port from a universe
    ///
    /// Never destroys the universe.
    pub fn remove_port(&mut self, id: UniverseId, port: PortId) -> Result<(), RegistryError> {
        self.get_mut(id)
            .ok_or(RegistryError::UniverseNotFound(id))?
            .remove_port(port)
    }

    /// Unpatch a port from whatever universe it is patched to
    ///
    /// Returns `None` if the port was not patched. Reports whether the
    /// universe is now unused; destroying it is left to the caller.
    pub fn unpatch_port(&mut self, port_id: PortId) -> Result<Option<Unpatched>, RegistryError> {
        let port = self
            .ports
            .get(&port_id)
            .ok_or(RegistryError::PortNotRegistered(port_id))?;

        let Some(current) = port.universe() else {
            return Ok(None);
        };
        port.set_universe(None);

        let Some(universe) = self.universes.get_mut(&current) else {
            tracing::debug!(port = %port_id, universe = %current, "Port was patched to a dead universe");
            return Ok(None);
        };

        universe.detach_port(port_id);
        tracing::debug!(port = %port_id, universe = %current, "Port unpatched");

        Ok(Some(Unpatched {
            universe: current,
            now_unused: !universe.in_use(),
        }))
    }

    /// Signal that a port's input changed
    ///
    /// Resolves the universe the port is patched to and re-derives its frame.
    /// Returns `None` if the port is unknown or unpatched, or if the universe
    /// did not fan out.
    pub fn port_data_changed(&mut self, port: PortId) -> Option<FanoutReport> {
        let id = self.ports.get(&port)?.universe()?;
        self.get_mut(id)?.port_data_changed(port)
    }

    /// Destroy a universe
    ///
    /// Ports still patched to it are unpatched. Returns false if there was no
    /// such universe.
    pub fn destroy(&mut self, id: UniverseId) -> bool {
        let Some(mut universe) = self.universes.remove(&id) else {
            return false;
        };

        for port_id in universe.take_ports() {
            if let Some(port) = self.ports.get(&port_id) {
                if port.universe() == Some(id) {
                    port.set_universe(None);
                }
            }
        }

        self.stats.universes_destroyed += 1;
        tracing::info!(universe = %id, "Universe destroyed");
        true
    }

    /// Destroy every universe with no ports and no clients
    ///
    /// Returns the ids that were destroyed.
    pub fn check_for_unused(&mut self) -> Vec<UniverseId> {
        let unused: Vec<UniverseId> = self
            .universes
            .values()
            .filter(|u| !u.in_use())
            .map(Universe::id)
            .collect();

        for &id in &unused {
            self.destroy(id);
        }

        if !unused.is_empty() {
            tracing::debug!(count = unused.len(), "Removed unused universes");
        }
        unused
    }

    /// Destroy every universe, used or not
    ///
    /// Returns the number destroyed.
    pub fn clean_up(&mut self) -> usize {
        let ids = self.ids();
        for &id in &ids {
            self.destroy(id);
        }
        ids.len()
    }

    /// Spawn background sweep task
    ///
    /// Calls [`check_for_unused`](Self::check_for_unused) every
    /// `sweep_interval`. Returns a handle that can be used to abort the task.
    pub fn spawn_sweep_task(registry: &SharedRegistry) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(registry);

        tokio::spawn(async move {
            // interval() panics on a zero period
            let interval = registry
                .lock()
                .await
                .config
                .sweep_interval
                .max(Duration::from_millis(1));
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.lock().await.check_for_unused();
            }
        })
    }
}
