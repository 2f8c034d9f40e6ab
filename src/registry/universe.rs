//! Universe state
//!
//! This module defines the per-universe state stored in the registry. A
//! [`Universe`] only holds data and membership; operations that reach ports,
//! clients or storage go through [`UniverseMut`](super::UniverseMut).

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::{Client, ClientId};
use crate::port::PortId;
use crate::settings::UniverseSettings;

use super::frame::{DmxFrame, UniverseId};
use super::merge::MergeMode;

/// A DMX universe: one frame plus the ports and clients attached to it
pub struct Universe {
    id: UniverseId,

    /// Display label
    name: String,

    merge_mode: MergeMode,

    /// Authoritative DMX data
    frame: DmxFrame,

    /// Patched ports, in patch order
    ports: Vec<PortId>,

    /// Registered clients, in registration order
    clients: Vec<Arc<dyn Client>>,

    created_at: Instant,
}

impl Universe {
    /// Create a universe with default state: no name, LTP, blacked-out frame
    pub fn new(id: UniverseId) -> Self {
        Self {
            id,
            name: String::new(),
            merge_mode: MergeMode::default(),
            frame: DmxFrame::blackout(),
            ports: Vec::new(),
            clients: Vec::new(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> UniverseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn merge_mode(&self) -> MergeMode {
        self.merge_mode
    }

    /// Current frame
    pub fn frame(&self) -> &DmxFrame {
        &self.frame
    }

    /// Current channel values
    pub fn dmx(&self) -> &[u8] {
        self.frame.as_slice()
    }

    /// Copy the current frame into `out`
    ///
    /// Returns the number of bytes copied: the smaller of `out.len()` and the
    /// frame length.
    pub fn get_dmx(&self, out: &mut [u8]) -> usize {
        self.frame.copy_to(out)
    }

    /// Patched ports, in patch order
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn has_port(&self, port: PortId) -> bool {
        self.ports.contains(&port)
    }

    /// Registered clients, in registration order
    pub fn clients(&self) -> impl Iterator<Item = &Arc<dyn Client>> {
        self.clients.iter()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|c| c.id()).collect()
    }

    pub fn has_client(&self, client: ClientId) -> bool {
        self.clients.iter().any(|c| c.id() == client)
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// A universe is in use while it has at least one port or client
    pub fn in_use(&self) -> bool {
        !self.ports.is_empty() || !self.clients.is_empty()
    }

    /// When the universe was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Overwrite the persisted fields
    ///
    /// Used by [`SettingsStore`](crate::settings::SettingsStore)
    /// implementations during hydration; does not trigger a save.
    pub fn apply_settings(&mut self, settings: UniverseSettings) {
        self.name = settings.name;
        self.merge_mode = settings.merge_mode;
    }

    /// Snapshot of this universe's counters
    pub fn stats(&self) -> UniverseStats {
        UniverseStats {
            port_count: self.ports.len(),
            client_count: self.clients.len(),
            merge_mode: self.merge_mode,
            frame_len: self.frame.len(),
            uptime: self.created_at.elapsed(),
        }
    }

    pub(super) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(super) fn set_merge_mode(&mut self, mode: MergeMode) {
        self.merge_mode = mode;
    }

    pub(super) fn frame_mut(&mut self) -> &mut DmxFrame {
        &mut self.frame
    }

    /// Append a port; returns false if it was already patched here
    pub(super) fn attach_port(&mut self, port: PortId) -> bool {
        if self.has_port(port) {
            return false;
        }
        self.ports.push(port);
        true
    }

    /// Remove a port; returns false if it was not patched here
    pub(super) fn detach_port(&mut self, port: PortId) -> bool {
        match self.ports.iter().position(|&p| p == port) {
            Some(index) => {
                self.ports.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append a client; returns false if it was already registered
    pub(super) fn attach_client(&mut self, client: Arc<dyn Client>) -> bool {
        if self.has_client(client.id()) {
            return false;
        }
        self.clients.push(client);
        true
    }

    /// Remove a client; returns false if it was not registered
    pub(super) fn detach_client(&mut self, client: ClientId) -> bool {
        match self.clients.iter().position(|c| c.id() == client) {
            Some(index) => {
                self.clients.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every port, returning the ids that were patched
    pub(super) fn take_ports(&mut self) -> Vec<PortId> {
        std::mem::take(&mut self.ports)
    }
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("merge_mode", &self.merge_mode)
            .field("frame_len", &self.frame.len())
            .field("ports", &self.ports)
            .field("clients", &self.client_ids())
            .finish()
    }
}

/// Statistics for a universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseStats {
    /// Number of patched ports
    pub port_count: usize,
    /// Number of registered clients
    pub client_count: usize,
    /// Current merge policy
    pub merge_mode: MergeMode,
    /// Current frame length
    pub frame_len: usize,
    /// Time since the universe was created
    pub uptime: Duration,
}
