//! Patch demo - routes two console inputs through an HTP universe
//!
//! Run with: cargo run --example patch_demo
//!
//! Set `RUST_LOG=dmx_router=trace` to see every merge and send.
//!
//! This example demonstrates:
//! - Implementing `Port` with a `PatchSlot` back-reference
//! - A `Transport` that sends DMX over UDP to a listening client
//! - HTP merging of two inputs into one universe
//! - Re-patching a port and the background sweep reaping unused universes
//!
//! # Layout
//!
//! ```text
//!   [port 1: console] ──┐
//!                       ├──► universe 1 (HTP) ──► [port 3: dimmer rack]
//!   [port 2: backup ] ──┘           │
//!                                   └──────────► UDP client 127.0.0.1:*
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::net::UdpSocket;

use dmx_router::client::{Client, ClientId, Transport};
use dmx_router::port::{PatchSlot, Port, PortId};
use dmx_router::protocol::DmxMessage;
use dmx_router::registry::{PatchOutcome, UniverseId};
use dmx_router::settings::MemoryStore;
use dmx_router::{MergeMode, RegistryConfig, UniverseRegistry};

/// In-process port: input is set by hand, output is printed
struct DemoPort {
    id: PortId,
    label: &'static str,
    input: Mutex<Option<Vec<u8>>>,
    patch: PatchSlot,
}

impl DemoPort {
    fn new(id: u32, label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id: PortId(id),
            label,
            input: Mutex::new(None),
            patch: PatchSlot::new(),
        })
    }

    fn feed(&self, data: &[u8]) {
        if let Ok(mut input) = self.input.lock() {
            *input = Some(data.to_vec());
        }
    }
}

impl Port for DemoPort {
    fn id(&self) -> PortId {
        self.id
    }

    fn is_readable(&self) -> bool {
        self.input.lock().map(|i| i.is_some()).unwrap_or(false)
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        let Ok(input) = self.input.lock() else {
            return 0;
        };
        match input.as_deref() {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                len
            }
            None => 0,
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        println!("  {} <- {:?}", self.label, &data[..data.len().min(8)]);
        Ok(())
    }

    fn universe(&self) -> Option<UniverseId> {
        self.patch.get()
    }

    fn set_universe(&self, universe: Option<UniverseId>) {
        self.patch.set(universe);
    }
}

struct UdpClient {
    id: ClientId,
    addr: SocketAddr,
}

impl Client for UdpClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn destination(&self) -> SocketAddr {
        self.addr
    }
}

/// Sends `[universe: u32 BE][len: u16 BE][data]` datagrams
struct UdpTransport {
    socket: UdpSocket,
}

impl Transport for UdpTransport {
    fn send(&self, msg: &DmxMessage) -> io::Result<()> {
        let mut buf = BytesMut::with_capacity(6 + msg.len());
        buf.put_u32(msg.universe.0);
        buf.put_u16(msg.len() as u16);
        buf.put_slice(&msg.data);

        // Never blocks the caller; a full socket buffer is reported as a failure
        self.socket.try_send_to(&buf, msg.destination)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dmx_router=debug".parse()?),
        )
        .init();

    let listener = UdpSocket::bind("127.0.0.1:0").await?;
    let transport = Arc::new(UdpTransport {
        socket: UdpSocket::bind("127.0.0.1:0").await?,
    });
    let store = Arc::new(MemoryStore::new());

    let config = RegistryConfig::default()
        .sweep_interval(Duration::from_secs(1))
        .slow_target_threshold(Duration::from_millis(5));
    let mut registry = UniverseRegistry::with_config(config, transport, store.clone());

    let console = DemoPort::new(1, "console");
    let backup = DemoPort::new(2, "backup");
    let rack = DemoPort::new(3, "dimmer rack");
    for port in [&console, &backup, &rack] {
        registry.register_port(port.clone())?;
    }

    let stage = UniverseId(1);
    {
        let mut universe = registry.get_or_create(stage)?;
        universe.set_name("Stage", true)?;
        universe.set_merge_mode(MergeMode::Htp, true)?;
        universe.add_client(Arc::new(UdpClient {
            id: ClientId(1),
            addr: listener.local_addr()?,
        }));
    }
    for port in [1, 2, 3] {
        registry.add_port(stage, PortId(port))?;
    }

    println!("HTP merge of console and backup:");
    console.feed(&[255, 0, 128, 10]);
    backup.feed(&[0, 200, 64]);
    if let Some(report) = registry.port_data_changed(PortId(1)) {
        println!(
            "  wrote {} ports, {} clients, {} failures",
            report.ports_written,
            report.clients_sent,
            report.failures.len()
        );
    }

    let mut datagram = [0u8; 600];
    let (len, _) = listener.recv_from(&mut datagram).await?;
    println!("  client received {} bytes: {:?}", len, &datagram[6..len]);

    // Moving the rack leaves the stage universe with its two inputs
    registry.get_or_create(UniverseId(2))?;
    if let PatchOutcome::Patched {
        donor,
        donor_destroyed,
    } = registry.add_port(UniverseId(2), PortId(3))?
    {
        println!(
            "Rack re-patched from {:?} (donor destroyed: {})",
            donor, donor_destroyed
        );
    }

    // Nothing is patched to universe 3, so the sweep will reap it
    registry.get_or_create(UniverseId(3))?;

    let shared = registry.into_shared();
    let sweep = UniverseRegistry::spawn_sweep_task(&shared);
    tokio::time::sleep(Duration::from_millis(1500)).await;

    {
        let mut registry = shared.lock().await;
        println!("Live universes after sweep: {:?}", registry.ids());
        for universe in registry.list() {
            println!("  {:?}", universe.stats());
        }

        sweep.abort();
        let destroyed = registry.clean_up();
        println!("Shut down, destroyed {} universes", destroyed);
        println!("Stats: {:?}", registry.stats());
    }

    println!("Saved settings: {:?}", store.get(stage)?);
    Ok(())
}
