use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chat prototype settings (`[studio]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Delay between streamed words.
    pub word_interval_ms: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            word_interval_ms: 30,
        }
    }
}

impl StudioConfig {
    pub fn word_interval(&self) -> Duration {
        Duration::from_millis(self.word_interval_ms.max(1))
    }
}
