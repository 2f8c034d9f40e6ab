//! # dmx-router
//!
//! Data-routing core for a DMX512 lighting-control daemon.
//!
//! The crate keeps a registry of *universes*. Each universe owns one DMX frame
//! (up to 512 channels), the set of ports patched to it, and the set of
//! network clients listening to it. Ports push input into their universe,
//! which merges contributions under its merge mode and fans the result out to
//! every port and client.
//!
//! Hardware drivers, the network transport and the settings backend stay
//! outside this crate; they plug in through the [`port::Port`],
//! [`client::Client`], [`client::Transport`] and
//! [`settings::SettingsStore`] traits.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dmx_router::client::Transport;
//! use dmx_router::protocol::DmxMessage;
//! use dmx_router::registry::{MergeMode, UniverseId, UniverseRegistry};
//! use dmx_router::settings::MemoryStore;
//!
//! struct LogTransport;
//!
//! impl Transport for LogTransport {
//!     fn send(&self, msg: &DmxMessage) -> std::io::Result<()> {
//!         println!("{} channels for universe {}", msg.len(), msg.universe);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> dmx_router::Result<()> {
//! let mut registry = UniverseRegistry::new(Arc::new(LogTransport), Arc::new(MemoryStore::new()));
//!
//! let mut universe = registry.get_or_create(UniverseId(1))?;
//! universe.set_merge_mode(MergeMode::Htp, true)?;
//! universe.set_dmx(&[255, 128, 0]);
//!
//! registry.check_for_unused();
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: universes, merge engine, fan-out and the registry itself
//! - [`port`], [`client`]: capability contracts for endpoints and subscribers
//! - [`protocol`]: outbound message shape
//! - [`settings`]: persistence of universe names and merge modes
//! - [`stats`]: registry counters

pub mod client;
pub mod error;
pub mod port;
pub mod protocol;
pub mod registry;
pub mod settings;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{MergeMode, RegistryConfig, UniverseId, UniverseRegistry};
