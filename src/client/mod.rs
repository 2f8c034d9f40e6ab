//! Client capability contracts
//!
//! Clients are network subscribers registered with a universe. They are owned
//! by the session layer; a universe only holds an `Arc<dyn Client>` and asks
//! it where to send data. Delivery goes through the injected [`Transport`].

use std::io;
use std::net::SocketAddr;

use crate::protocol::DmxMessage;

/// Identifier for a client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subscriber that receives DMX data for the universes it registered with
pub trait Client: Send + Sync {
    /// Session identifier, used for membership checks
    fn id(&self) -> ClientId;

    /// Address outbound messages are sent to
    fn destination(&self) -> SocketAddr;
}

/// Outbound message sink shared by every universe
///
/// Implementations should not block for long: fan-out calls `send` once per
/// client, synchronously, from the event loop.
pub trait Transport: Send + Sync {
    /// Send one message to `msg.destination`
    ///
    /// Implementations must enforce their own timeout. A send that returns
    /// late is only logged as slow, after the fact.
    fn send(&self, msg: &DmxMessage) -> io::Result<()>;
}
