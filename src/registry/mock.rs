//! Test doubles for ports, clients and the transport

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::client::{Client, ClientId, Transport};
use crate::port::{PatchSlot, Port, PortId};
use crate::protocol::DmxMessage;

use super::frame::UniverseId;

/// Port with a settable input frame that records every write
pub(crate) struct MockPort {
    id: PortId,
    input: Mutex<Option<Vec<u8>>>,
    writes: Mutex<Vec<Vec<u8>>>,
    fail_writes: bool,
    patch: PatchSlot,
}

impl MockPort {
    pub(crate) fn new(id: u32) -> Arc<Self> {
        Arc::new(Self::build(id, false))
    }

    pub(crate) fn failing(id: u32) -> Arc<Self> {
        Arc::new(Self::build(id, true))
    }

    fn build(id: u32, fail_writes: bool) -> Self {
        Self {
            id: PortId(id),
            input: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            fail_writes,
            patch: PatchSlot::new(),
        }
    }

    /// Make the port readable with the given input frame
    pub(crate) fn set_input(&self, data: &[u8]) {
        *self.input.lock().unwrap() = Some(data.to_vec());
    }

    /// Make the port unreadable
    pub(crate) fn clear_input(&self) {
        *self.input.lock().unwrap() = None;
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().unwrap().last().cloned()
    }
}

impl Port for MockPort {
    fn id(&self) -> PortId {
        self.id
    }

    fn is_readable(&self) -> bool {
        self.input.lock().unwrap().is_some()
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        match self.input.lock().unwrap().as_ref() {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                len
            }
            None => 0,
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn universe(&self) -> Option<UniverseId> {
        self.patch.get()
    }

    fn set_universe(&self, universe: Option<UniverseId>) {
        self.patch.set(universe);
    }
}

pub(crate) struct MockClient {
    id: ClientId,
    destination: SocketAddr,
}

impl MockClient {
    pub(crate) fn new(id: u64) -> Arc<Self> {
        let port = 9000 + (id % 1000) as u16;
        Arc::new(Self {
            id: ClientId(id),
            destination: SocketAddr::from(([127, 0, 0, 1], port)),
        })
    }
}

impl Client for MockClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn destination(&self) -> SocketAddr {
        self.destination
    }
}

/// Transport that keeps every message, optionally refusing some destinations
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<DmxMessage>>,
    refuse: Mutex<Vec<SocketAddr>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn refuse(&self, destination: SocketAddr) {
        self.refuse.lock().unwrap().push(destination);
    }

    pub(crate) fn sent(&self) -> Vec<DmxMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, msg: &DmxMessage) -> io::Result<()> {
        if self.refuse.lock().unwrap().contains(&msg.destination) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "client went away",
            ));
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}
