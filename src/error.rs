//! Crate-level error types
//!
//! Each subsystem defines its own error enum; [`Error`] wraps them so callers
//! that drive several subsystems can use a single `Result`.

use std::fmt;
use std::io;

use crate::registry::RegistryError;
use crate::settings::StoreError;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Universe registry error
    Registry(RegistryError),
    /// Settings persistence error
    Store(StoreError),
    /// I/O error from a port or transport
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Store(e) => write!(f, "Store error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Registry(e) => Some(e),
            Error::Store(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;
