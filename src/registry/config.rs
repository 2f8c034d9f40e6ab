//! Registry configuration

use std::time::Duration;

/// Universe registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of live universes (0 = unlimited)
    pub max_universes: usize,

    /// Interval between background sweeps for unused universes
    pub sweep_interval: Duration,

    /// Port writes or client sends slower than this are logged
    pub slow_target_threshold: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_universes: 0, // Unlimited
            sweep_interval: Duration::from_secs(30),
            slow_target_threshold: Duration::from_millis(10),
        }
    }
}

impl RegistryConfig {
    /// Set maximum number of universes
    pub fn max_universes(mut self, max: usize) -> Self {
        self.max_universes = max;
        self
    }

    /// Set the sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the slow-target warning threshold
    pub fn slow_target_threshold(mut self, threshold: Duration) -> Self {
        self.slow_target_threshold = threshold;
        self
    }
}
