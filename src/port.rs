//! Port capability contract
//!
//! A port is a DMX endpoint owned by a driver (USB widget, Art-Net node,
//! loopback device...). The registry never owns ports; it keeps an
//! `Arc<dyn Port>` in its port table and refers to each port by [`PortId`].
//! The port in turn remembers which universe it is patched to, as a
//! [`UniverseId`] handle.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::registry::UniverseId;

/// Identifier for a port, unique within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub u32);

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A DMX source and/or sink
///
/// Methods take `&self` because drivers usually share the port with an I/O
/// thread; implementations use interior mutability for their buffers.
pub trait Port: Send + Sync {
    /// Identifier used for lookups and diagnostics
    fn id(&self) -> PortId;

    /// Whether the port currently has input data to offer
    fn is_readable(&self) -> bool;

    /// Copy the port's input frame into `buf`, returning the bytes written
    fn read(&self, buf: &mut [u8]) -> usize;

    /// Output a frame on this port
    ///
    /// Called synchronously during fan-out. Implementations must enforce
    /// their own timeout; the registry only logs a write that ran long.
    fn write(&self, data: &[u8]) -> io::Result<()>;

    /// Universe this port is patched to
    fn universe(&self) -> Option<UniverseId>;

    /// Update the patch back-reference
    ///
    /// Only the registry calls this; drivers must not patch themselves.
    fn set_universe(&self, universe: Option<UniverseId>);
}

/// Port table held by the registry
pub type PortTable = HashMap<PortId, Arc<dyn Port>>;

const UNPATCHED: u64 = u64::MAX;

/// Lock-free storage for a port's patch back-reference
///
/// Drivers can embed one of these and forward [`Port::universe`] and
/// [`Port::set_universe`] to it.
#[derive(Debug)]
pub struct PatchSlot(AtomicU64);

impl PatchSlot {
    /// Create an unpatched slot
    pub fn new() -> Self {
        Self(AtomicU64::new(UNPATCHED))
    }

    /// Current universe, if patched
    pub fn get(&self) -> Option<UniverseId> {
        match self.0.load(Ordering::Acquire) {
            UNPATCHED => None,
            id => Some(UniverseId(id as u32)),
        }
    }

    /// Set or clear the universe
    pub fn set(&self, universe: Option<UniverseId>) {
        let raw = universe.map_or(UNPATCHED, |u| u64::from(u.0));
        self.0.store(raw, Ordering::Release);
    }
}

impl Default for PatchSlot {
    fn default() -> Self {
        Self::new()
    }
}
