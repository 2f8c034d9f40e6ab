//! Update propagation
//!
//! After a universe's frame changes, the new frame is written to every
//! patched port (in patch order) and then sent to every registered client (in
//! registration order). A failing or slow target never stops delivery to the
//! remaining ones; failures are collected in a [`FanoutReport`].

use std::io;
use std::time::{Duration, Instant};

use crate::client::{ClientId, Transport};
use crate::port::{PortId, PortTable};
use crate::protocol::DmxMessage;

use super::universe::Universe;

/// A port or client that fan-out delivers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutTarget {
    Port(PortId),
    Client(ClientId),
}

impl std::fmt::Display for FanoutTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FanoutTarget::Port(id) => write!(f, "port {}", id),
            FanoutTarget::Client(id) => write!(f, "client {}", id),
        }
    }
}

/// Delivery failure for a single target
#[derive(Debug)]
pub struct FanoutFailure {
    pub target: FanoutTarget,
    pub error: io::Error,
}

/// Outcome of one fan-out
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Ports that accepted the frame
    pub ports_written: usize,
    /// Clients the transport accepted a message for
    pub clients_sent: usize,
    /// Targets that took longer than the configured threshold
    pub slow_targets: usize,
    /// Targets that failed
    pub failures: Vec<FanoutFailure>,
}

impl FanoutReport {
    /// True if every target received the frame
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn port_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.target, FanoutTarget::Port(_)))
            .count()
    }

    pub fn client_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.target, FanoutTarget::Client(_)))
            .count()
    }
}

/// Write the universe's frame to all of its ports and clients
pub(crate) fn update_dependants(
    universe: &Universe,
    ports: &PortTable,
    transport: &dyn Transport,
    slow_threshold: Duration,
) -> FanoutReport {
    let mut report = FanoutReport::default();
    let data = universe.dmx();

    for &port_id in universe.ports() {
        let target = FanoutTarget::Port(port_id);

        let Some(port) = ports.get(&port_id) else {
            tracing::warn!(
                universe = %universe.id(),
                port = %port_id,
                "Patched port missing from port table"
            );
            report.failures.push(FanoutFailure {
                target,
                error: io::Error::new(io::ErrorKind::NotFound, "port not registered"),
            });
            continue;
        };

        let started = Instant::now();
        let result = port.write(data);
        check_slow(&mut report, universe, target, started, slow_threshold);

        match result {
            Ok(()) => report.ports_written += 1,
            Err(error) => {
                tracing::warn!(
                    universe = %universe.id(),
                    port = %port_id,
                    error = %error,
                    "Port write failed"
                );
                report.failures.push(FanoutFailure { target, error });
            }
        }
    }

    if universe.client_count() > 0 {
        // One copy of the frame shared by every message
        let payload = universe.frame().to_bytes();

        for client in universe.clients() {
            let target = FanoutTarget::Client(client.id());
            let msg = DmxMessage::dmx_data(universe.id(), payload.clone(), client.destination());

            tracing::debug!(
                universe = %universe.id(),
                client = %client.id(),
                destination = %msg.destination,
                len = msg.len(),
                "Sending DMX data"
            );

            let started = Instant::now();
            let result = transport.send(&msg);
            check_slow(&mut report, universe, target, started, slow_threshold);

            match result {
                Ok(()) => report.clients_sent += 1,
                Err(error) => {
                    tracing::warn!(
                        universe = %universe.id(),
                        client = %client.id(),
                        error = %error,
                        "Client send failed"
                    );
                    report.failures.push(FanoutFailure { target, error });
                }
            }
        }
    }

    report
}

fn check_slow(
    report: &mut FanoutReport,
    universe: &Universe,
    target: FanoutTarget,
    started: Instant,
    threshold: Duration,
) {
    let elapsed = started.elapsed();
    if elapsed > threshold {
        report.slow_targets += 1;
        tracing::warn!(
            universe = %universe.id(),
            target = %target,
            elapsed_us = elapsed.as_micros() as u64,
            "Slow fan-out target"
        );
    }
}
