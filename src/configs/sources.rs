use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "enabled")]
    pub http: bool,
    #[serde(default = "enabled")]
    pub local: bool,
    /// Root directory searched by the local source.
    #[serde(default = "default_local_library")]
    pub local_library: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            http: true,
            local: true,
            local_library: default_local_library(),
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_local_library() -> String {
    "./music".to_string()
}
