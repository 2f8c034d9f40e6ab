//! Outbound client messages
//!
//! Only the shape of the message is defined here. Framing and sending belong
//! to the [`Transport`](crate::client::Transport) implementation.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::registry::{UniverseId, DMX_UNIVERSE_SIZE};

/// Operation carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// DMX data for one universe
    DmxData,
}

/// A message addressed to one client
///
/// `data` is reference counted, so building one message per client during a
/// fan-out shares a single copy of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxMessage {
    /// Operation code
    pub op: Opcode,
    /// Universe the data belongs to
    pub universe: UniverseId,
    /// Channel values (at most 512)
    pub data: Bytes,
    /// Where the transport should deliver the message
    pub destination: SocketAddr,
}

impl DmxMessage {
    /// Create a DMX data message
    ///
    /// Payloads longer than a universe are truncated.
    pub fn dmx_data(universe: UniverseId, data: Bytes, destination: SocketAddr) -> Self {
        let data = if data.len() > DMX_UNIVERSE_SIZE {
            data.slice(..DMX_UNIVERSE_SIZE)
        } else {
            data
        };

        Self {
            op: Opcode::DmxData,
            universe,
            data,
            destination,
        }
    }

    /// Payload length in channels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
