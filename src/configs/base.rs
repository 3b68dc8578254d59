use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub player: PlayerConfig,
  #[serde(default)]
  pub sources: SourcesConfig,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    Self::from_file(config_path)
  }

  pub fn from_file(path: &str) -> AnyResult<Self> {
    let config_str = std::fs::read_to_string(path)?;
    if config_str.trim().is_empty() {
      return Err(format!("{} is empty", path).into());
    }

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
  }
}
