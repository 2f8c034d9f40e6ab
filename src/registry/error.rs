//! Registry error types
//!
//! Error types for universe registry operations.

use crate::client::ClientId;
use crate::port::PortId;

use super::frame::UniverseId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No live universe with this id
    UniverseNotFound(UniverseId),
    /// Port is not patched to the universe
    PortNotFound { universe: UniverseId, port: PortId },
    /// Port id is not in the registry's port table
    PortNotRegistered(PortId),
    /// A port with this id is already in the port table
    PortAlreadyRegistered(PortId),
    /// Client is not registered with the universe
    ClientNotFound {
        universe: UniverseId,
        client: ClientId,
    },
    /// Creating another universe would exceed the configured limit
    CapacityExceeded { limit: usize },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::UniverseNotFound(id) => write!(f, "Universe not found: {}", id),
            RegistryError::PortNotFound { universe, port } => {
                write!(f, "Port {} is not patched to universe {}", port, universe)
            }
            RegistryError::PortNotRegistered(port) => write!(f, "Port not registered: {}", port),
            RegistryError::PortAlreadyRegistered(port) => {
                write!(f, "Port already registered: {}", port)
            }
            RegistryError::ClientNotFound { universe, client } => {
                write!(
                    f,
                    "Client {} is not registered with universe {}",
                    client, universe
                )
            }
            RegistryError::CapacityExceeded { limit } => {
                write!(f, "Universe limit reached ({})", limit)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
