//! Store settings.

use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Days a soft-deleted note stays restorable before the sweep may
    /// purge it.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_retention_days() -> i64 {
    30
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

impl RetentionSettings {
    pub fn window(&self) -> Duration {
        Duration::days(self.retention_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: RetentionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.retention_days, 30);
        assert_eq!(settings.window(), Duration::days(30));
    }
}
