//! Statistics for the universe registry

use crate::registry::FanoutReport;

/// Registry-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Universes created since startup
    pub universes_created: u64,
    /// Universes destroyed since startup (reaped, cascaded or cleaned up)
    pub universes_destroyed: u64,
    /// Fan-outs performed
    pub fanouts: u64,
    /// Port writes that failed
    pub port_write_failures: u64,
    /// Client sends that failed
    pub client_send_failures: u64,
    /// Targets slower than the configured threshold
    pub slow_targets: u64,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of universes currently alive according to the counters
    pub fn live_universes(&self) -> u64 {
        self.universes_created.saturating_sub(self.universes_destroyed)
    }

    /// Fold one fan-out into the counters
    pub fn record_fanout(&mut self, report: &FanoutReport) {
        self.fanouts += 1;
        self.port_write_failures += report.port_failures() as u64;
        self.client_send_failures += report.client_failures() as u64;
        self.slow_targets += report.slow_targets as u64;
    }
}
