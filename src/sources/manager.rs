use async_trait::async_trait;

use super::{
  http::HttpSource,
  local::LocalSource,
  plugin::{BoxedSource, Resolver},
};
use crate::{
  common::errors::ResolutionError,
  configs::SourcesConfig,
  protocol::tracks::{LoadResult, SearchCandidate},
};

/// Source Manager
pub struct SourceManager {
  sources: Vec<BoxedSource>,
}

impl SourceManager {
  /// Create a new SourceManager with every source enabled in `[sources]`.
  pub fn new(config: &SourcesConfig) -> Self {
    let mut sources: Vec<BoxedSource> = Vec::new();

    macro_rules! register_source {
      ($enabled:expr, $name:literal, $ctor:expr) => {
        if $enabled {
          match $ctor {
            Ok(src) => {
              tracing::info!("Loaded source: {}", $name);
              sources.push(Box::new(src));
            }
            Err(e) => {
              tracing::error!("{} source failed to initialize: {}", $name, e);
            }
          }
        }
      };
    }

    register_source!(config.http, "http", HttpSource::new());
    register_source!(
      config.local,
      "local",
      LocalSource::new(config.local_library.as_str())
    );

    Self::with_sources(sources)
  }

  pub fn with_sources(sources: Vec<BoxedSource>) -> Self {
    Self { sources }
  }

  /// Get names of all registered sources
  pub fn source_names(&self) -> Vec<String> {
    self.sources.iter().map(|s| s.name().to_string()).collect()
  }
}

#[async_trait]
impl Resolver for SourceManager {
  async fn resolve(&self, locator: &str) -> Result<LoadResult, ResolutionError> {
    for source in &self.sources {
      if source.can_handle(locator) {
        tracing::trace!("Loading '{}' with source: {}", locator, source.name());
        return source.load(locator).await;
      }
    }

    tracing::debug!("No source could handle locator: {}", locator);
    Err(ResolutionError::Unsupported(locator.to_string()))
  }

  async fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchCandidate>, ResolutionError> {
    let mut candidates = Vec::with_capacity(limit);
    for source in &self.sources {
      if candidates.len() >= limit {
        break;
      }
      match source.search(text, limit - candidates.len()).await {
        Ok(found) => candidates.extend(found),
        Err(e) => tracing::warn!("{} search failed for '{}': {}", source.name(), text, e),
      }
    }
    candidates.truncate(limit);

    if candidates.is_empty() {
      return Err(ResolutionError::NoMatches(text.to_string()));
    }
    Ok(candidates)
  }
}
