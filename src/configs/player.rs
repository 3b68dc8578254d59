use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// How often the now-playing card is refreshed.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_progress_bar_width")]
    pub progress_bar_width: usize,
    /// Maximum number of candidates offered for a search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_selection_timeout_secs")]
    pub selection_timeout_secs: u64,
}

impl PlayerConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval_ms(),
            progress_bar_width: default_progress_bar_width(),
            search_limit: default_search_limit(),
            selection_timeout_secs: default_selection_timeout_secs(),
        }
    }
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_progress_bar_width() -> usize {
    20
}

fn default_search_limit() -> usize {
    5
}

fn default_selection_timeout_secs() -> u64 {
    60
}
