//! Universe registry
//!
//! The registry owns every live universe and routes DMX between ports and
//! clients. Each universe holds one 512-channel frame; when a patched port
//! reports new input, the universe re-derives its frame under its merge mode
//! and writes the result to every patched port and registered client.
//!
//! # Architecture
//!
//! ```text
//!                        UniverseRegistry
//!              ┌──────────────────────────────────┐
//!              │ universes: BTreeMap<Id, Universe │
//!              │   { frame, ports: [PortId],      │
//!              │     clients: [Arc<dyn Client>] }>│
//!              │ ports: HashMap<PortId, Arc<Port>>│
//!              │ transport, store                 │
//!              └────────────────┬─────────────────┘
//!                               │
//!      ┌────────────────────────┼────────────────────────┐
//!      │                        │                        │
//!      ▼                        ▼                        ▼
//!  [Port A] ──input──► port_data_changed() ──► merge (LTP / HTP)
//!                                                        │
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!         update_dependants() ──► Port::write() for every patched port
//!                             └─► Transport::send() for every client
//! ```
//!
//! # Handles
//!
//! Universes refer to ports by [`PortId`](crate::port::PortId) and ports refer
//! back by [`UniverseId`]. Neither side borrows the other, so a port can be
//! re-patched or a universe destroyed without dangling references; the
//! registry keeps both sides consistent.

pub mod config;
pub mod error;
pub mod fanout;
pub mod frame;
pub mod handle;
pub mod merge;
pub mod store;
pub mod universe;

#[cfg(test)]
pub(crate) mod mock;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use fanout::{FanoutFailure, FanoutReport, FanoutTarget};
pub use frame::{DmxFrame, UniverseId, DMX_UNIVERSE_SIZE};
pub use handle::UniverseMut;
pub use merge::{merge_highest, MergeMode, ParseMergeModeError};
pub use store::{PatchOutcome, SharedRegistry, UniverseRegistry, Unpatched};
pub use universe::{Universe, UniverseStats};
