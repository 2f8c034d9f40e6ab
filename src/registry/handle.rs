//! Mutable universe access
//!
//! [`UniverseMut`] borrows one universe out of the registry together with the
//! shared pieces it needs to act: the port table, the transport, the settings
//! store and the stats counters. Every operation that changes the frame ends
//! with exactly one fan-out.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{Client, ClientId, Transport};
use crate::port::{Port, PortId, PortTable};
use crate::settings::{SettingsStore, StoreError};
use crate::stats::RegistryStats;

use super::error::RegistryError;
use super::fanout::{update_dependants, FanoutReport};
use super::frame::DMX_UNIVERSE_SIZE;
use super::merge::MergeMode;
use super::universe::Universe;

/// A live universe borrowed mutably from the registry
///
/// Derefs to [`Universe`] for read access.
pub struct UniverseMut<'a> {
    universe: &'a mut Universe,
    ports: &'a PortTable,
    transport: &'a dyn Transport,
    store: &'a dyn SettingsStore,
    stats: &'a mut RegistryStats,
    slow_threshold: Duration,
}

impl<'a> UniverseMut<'a> {
    pub(super) fn new(
        universe: &'a mut Universe,
        ports: &'a PortTable,
        transport: &'a dyn Transport,
        store: &'a dyn SettingsStore,
        stats: &'a mut RegistryStats,
        slow_threshold: Duration,
    ) -> Self {
        Self {
            universe,
            ports,
            transport,
            store,
            stats,
            slow_threshold,
        }
    }

    /// Overwrite the frame and fan it out
    ///
    /// Data beyond 512 channels is dropped. This bypasses the merge mode: the
    /// new frame replaces whatever the ports contributed.
    pub fn set_dmx(&mut self, data: &[u8]) -> FanoutReport {
        let len = self.universe.frame_mut().set(data);

        tracing::trace!(universe = %self.universe.id(), len = len, "DMX set directly");

        self.fan_out()
    }

    /// Re-derive the frame after a port's input changed
    ///
    /// Under LTP only the signalling port is read, and only if it is patched
    /// here and readable; otherwise nothing happens and `None` is returned.
    /// Under HTP every readable patched port is merged, whichever port
    /// signalled, and the result is always fanned out once.
    pub fn port_data_changed(&mut self, port: PortId) -> Option<FanoutReport> {
        match self.universe.merge_mode() {
            MergeMode::Ltp => self.merge_latest(port),
            MergeMode::Htp => Some(self.merge_highest()),
        }
    }

    fn merge_latest(&mut self, port_id: PortId) -> Option<FanoutReport> {
        if !self.universe.has_port(port_id) {
            tracing::debug!(
                universe = %self.universe.id(),
                port = %port_id,
                "Change signalled by a port not patched here"
            );
            return None;
        }

        let port = self.ports.get(&port_id)?;
        if !port.is_readable() {
            return None;
        }

        let len = self.universe.frame_mut().fill_with(|buf| port.read(buf));
        tracing::trace!(universe = %self.universe.id(), port = %port_id, len = len, "LTP read");

        Some(self.fan_out())
    }

    fn merge_highest(&mut self) -> FanoutReport {
        let ports: &'a PortTable = self.ports;
        let readable: Vec<&Arc<dyn Port>> = self
            .universe
            .ports()
            .iter()
            .filter_map(|id| ports.get(id))
            .filter(|port| port.is_readable())
            .collect();

        let mut readable = readable.into_iter();
        if let Some(first) = readable.next() {
            let frame = self.universe.frame_mut();
            frame.fill_with(|buf| first.read(buf));

            let mut scratch = [0u8; DMX_UNIVERSE_SIZE];
            for port in readable {
                let len = port.read(&mut scratch).min(DMX_UNIVERSE_SIZE);
                frame.merge_highest(&scratch[..len]);
            }

            tracing::trace!(
                universe = %self.universe.id(),
                len = self.universe.frame().len(),
                "HTP merge"
            );
        }

        self.fan_out()
    }

    /// Unpatch a port from this universe
    ///
    /// Never destroys the universe, even if it is left unused; check
    /// [`Universe::in_use`] afterwards and destroy it through the registry if
    /// wanted.
    pub fn remove_port(&mut self, port: PortId) -> Result<(), RegistryError> {
        let id = self.universe.id();

        if !self.universe.detach_port(port) {
            tracing::debug!(universe = %id, port = %port, "Port not found in universe");
            return Err(RegistryError::PortNotFound { universe: id, port });
        }

        if let Some(handle) = self.ports.get(&port) {
            if handle.universe() == Some(id) {
                handle.set_universe(None);
            }
        }

        tracing::debug!(universe = %id, port = %port, "Port removed from universe");
        Ok(())
    }

    /// Register a client; returns false if it was already registered
    pub fn add_client(&mut self, client: Arc<dyn Client>) -> bool {
        let client_id = client.id();
        let added = self.universe.attach_client(client);

        if added {
            tracing::info!(universe = %self.universe.id(), client = %client_id, "Client added");
        }
        added
    }

    /// Unregister a client
    ///
    /// Like [`remove_port`](Self::remove_port), this never destroys the universe.
    pub fn remove_client(&mut self, client: ClientId) -> Result<(), RegistryError> {
        let id = self.universe.id();

        if !self.universe.detach_client(client) {
            tracing::debug!(universe = %id, client = %client, "Client not found in universe");
            return Err(RegistryError::ClientNotFound {
                universe: id,
                client,
            });
        }

        tracing::info!(universe = %id, client = %client, "Client removed");
        Ok(())
    }

    /// Rename the universe, persisting the change if `save` is set
    ///
    /// The new name is kept even if persisting fails.
    pub fn set_name(&mut self, name: impl Into<String>, save: bool) -> Result<(), StoreError> {
        self.universe.set_name(name.into());
        self.save_if(save)
    }

    /// Change the merge mode, persisting the change if `save` is set
    ///
    /// Takes effect on the next port change; the current frame is untouched.
    pub fn set_merge_mode(&mut self, mode: MergeMode, save: bool) -> Result<(), StoreError> {
        self.universe.set_merge_mode(mode);
        self.save_if(save)
    }

    /// Fan out the current frame without changing it
    pub fn refresh(&mut self) -> FanoutReport {
        self.fan_out()
    }

    fn save_if(&self, save: bool) -> Result<(), StoreError> {
        if !save {
            return Ok(());
        }

        self.store.persist(&*self.universe).map_err(|e| {
            tracing::warn!(universe = %self.universe.id(), error = %e, "Failed to persist universe");
            e
        })
    }

    fn fan_out(&mut self) -> FanoutReport {
        let report = update_dependants(
            &*self.universe,
            self.ports,
            self.transport,
            self.slow_threshold,
        );
        self.stats.record_fanout(&report);
        report
    }
}

impl std::fmt::Debug for UniverseMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.universe, f)
    }
}

impl Deref for UniverseMut<'_> {
    type Target = Universe;

    fn deref(&self) -> &Universe {
        &*self.universe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mock::{MockClient, MockPort, RecordingTransport};
    use crate::registry::{UniverseId, UniverseRegistry};
    use crate::settings::{MemoryStore, NullStore};

    const U: UniverseId = UniverseId(1);

    struct Fixture {
        registry: UniverseRegistry,
        transport: Arc<RecordingTransport>,
        ports: Vec<Arc<MockPort>>,
    }

    fn fixture(mode: MergeMode, port_ids: &[u32]) -> Fixture {
        let transport = RecordingTransport::new();
        let mut registry = UniverseRegistry::new(transport.clone(), Arc::new(NullStore));
        registry
            .get_or_create(U)
            .unwrap()
            .set_merge_mode(mode, false)
            .unwrap();

        let ports = port_ids
            .iter()
            .map(|&id| {
                let port = MockPort::new(id);
                registry.register_port(port.clone()).unwrap();
                registry.add_port(U, PortId(id)).unwrap();
                port
            })
            .collect();

        Fixture {
            registry,
            transport,
            ports,
        }
    }

    #[test]
    fn test_ltp_last_writer_wins() {
        let mut f = fixture(MergeMode::Ltp, &[1, 2]);
        let mut universe = f.registry.get_mut(U).unwrap();

        f.ports[0].set_input(&[10, 20, 30]);
        assert!(universe.port_data_changed(PortId(1)).is_some());

        f.ports[1].set_input(&[1, 2]);
        assert!(universe.port_data_changed(PortId(2)).is_some());

        assert_eq!(universe.dmx(), &[1, 2]);
        assert_eq!(universe.frame().len(), 2);
    }

    #[test]
    fn test_ltp_ignores_unreadable_and_foreign_ports() {
        let mut f = fixture(MergeMode::Ltp, &[1]);
        f.ports[0].set_input(&[4, 4]);
        f.registry.port_data_changed(PortId(1)).unwrap();

        let stranger = MockPort::new(9);
        stranger.set_input(&[99]);
        f.registry.register_port(stranger).unwrap();

        let mut universe = f.registry.get_mut(U).unwrap();
        assert!(universe.port_data_changed(PortId(9)).is_none());

        f.ports[0].clear_input();
        assert!(universe.port_data_changed(PortId(1)).is_none());

        assert_eq!(universe.dmx(), &[4, 4]);
    }

    #[test]
    fn test_htp_order_independent() {
        for patch_order in [[2, 3], [3, 2]] {
            let mut f = fixture(MergeMode::Htp, &patch_order);
            for port in &f.ports {
                match port.id() {
                    PortId(2) => port.set_input(&[50, 10]),
                    _ => port.set_input(&[20, 90, 5]),
                }
            }

            let mut universe = f.registry.get_mut(U).unwrap();
            for port in patch_order.iter().rev() {
                universe.port_data_changed(PortId(*port)).unwrap();
            }

            assert_eq!(universe.dmx(), &[50, 90, 5]);
            assert_eq!(universe.frame().len(), 3);
        }
    }

    #[test]
    fn test_htp_skips_unreadable_ports() {
        let mut f = fixture(MergeMode::Htp, &[1, 2, 3]);
        f.ports[1].set_input(&[0, 7]);
        f.ports[2].set_input(&[3]);

        let report = f
            .registry
            .get_mut(U)
            .unwrap()
            .port_data_changed(PortId(1))
            .unwrap();

        assert_eq!(f.registry.get(U).unwrap().dmx(), &[3, 7]);
        assert_eq!(report.ports_written, 3);
    }

    #[test]
    fn test_htp_without_readable_ports_still_fans_out_once() {
        let mut f = fixture(MergeMode::Htp, &[1]);
        f.registry.get_mut(U).unwrap().set_dmx(&[8, 8]);
        let writes_before = f.ports[0].writes().len();

        let report = f.registry.port_data_changed(PortId(1)).unwrap();

        assert_eq!(report.ports_written, 1);
        assert_eq!(f.ports[0].writes().len(), writes_before + 1);
        assert_eq!(f.registry.get(U).unwrap().dmx(), &[8, 8]);
    }

    #[test]
    fn test_set_dmx_fans_out_to_ports_and_client() {
        let mut f = fixture(MergeMode::Ltp, &[1, 2]);
        let mut universe = f.registry.get_mut(U).unwrap();
        universe.add_client(MockClient::new(1));

        let report = universe.set_dmx(&[7, 8, 9]);

        assert!(report.is_complete());
        assert_eq!(f.ports[0].last_write().unwrap(), vec![7, 8, 9]);
        assert_eq!(f.ports[1].last_write().unwrap(), vec![7, 8, 9]);

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].universe, U);
        assert_eq!(sent[0].len(), 3);
        assert_eq!(&sent[0].data[..], &[7, 8, 9]);
        assert_eq!(f.registry.stats().fanouts, 1);
    }

    #[test]
    fn test_set_dmx_overrides_htp() {
        let mut f = fixture(MergeMode::Htp, &[1]);
        f.ports[0].set_input(&[255, 255]);
        f.registry.port_data_changed(PortId(1)).unwrap();

        let mut universe = f.registry.get_mut(U).unwrap();
        universe.set_dmx(&[1]);

        assert_eq!(universe.dmx(), &[1]);
    }

    #[test]
    fn test_set_dmx_then_get_dmx_round_trip() {
        let mut f = fixture(MergeMode::Ltp, &[]);
        let data: Vec<u8> = (0..600).map(|i| (i % 256) as u8).collect();

        let mut universe = f.registry.get_mut(U).unwrap();
        universe.set_dmx(&data);

        let mut out = vec![0u8; 600];
        let copied = universe.get_dmx(&mut out);

        assert_eq!(copied, DMX_UNIVERSE_SIZE);
        assert_eq!(&out[..copied], &data[..DMX_UNIVERSE_SIZE]);
    }

    #[test]
    fn test_remove_client_not_found() {
        let mut f = fixture(MergeMode::Ltp, &[]);
        let mut universe = f.registry.get_mut(U).unwrap();

        assert!(universe.add_client(MockClient::new(3)));
        assert!(!universe.add_client(MockClient::new(3)));
        universe.remove_client(ClientId(3)).unwrap();

        assert_eq!(
            universe.remove_client(ClientId(3)),
            Err(RegistryError::ClientNotFound {
                universe: U,
                client: ClientId(3)
            })
        );
        assert!(!universe.in_use());
    }

    #[test]
    fn test_debug_shows_universe() {
        let mut f = fixture(MergeMode::Htp, &[4]);
        let universe = f.registry.get_mut(U).unwrap();

        let shown = format!("{:?}", universe);
        assert!(shown.starts_with("Universe"));
        assert!(shown.contains("Htp"));
        assert!(shown.contains("PortId(4)"));
    }

    #[test]
    fn test_setters_persist_only_when_asked() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = UniverseRegistry::new(RecordingTransport::new(), store.clone());
        let mut universe = registry.get_or_create(U).unwrap();

        universe.set_name("Floor", false).unwrap();
        assert!(store.get(U).unwrap().is_none());

        universe.set_merge_mode(MergeMode::Htp, true).unwrap();
        let saved = store.get(U).unwrap().unwrap();
        assert_eq!(saved.name, "Floor");
        assert_eq!(saved.merge_mode, MergeMode::Htp);
    }
}
