//! Sync settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Seconds between opportunistic drain passes.
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
}

fn default_drain_interval_secs() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            drain_interval_secs: default_drain_interval_secs(),
        }
    }
}

impl SyncSettings {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }
}
