//! Daemon-to-client message types

pub mod message;

pub use message::{DmxMessage, Opcode};
