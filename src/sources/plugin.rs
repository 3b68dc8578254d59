use async_trait::async_trait;

use crate::{
    common::errors::ResolutionError,
    protocol::tracks::{LoadResult, SearchCandidate},
};

/// Trait that all source plugins must implement.
///
/// Each source (HTTP, local files) implements this trait to provide
/// track resolution and, when it has a catalogue, search.
#[async_trait]
pub trait SourcePlugin: Send + Sync {
    /// Unique identifier for this source (e.g., "http", "local")
    fn name(&self) -> &str;

    /// Check if this source can handle the given locator.
    fn can_handle(&self, locator: &str) -> bool;

    /// Resolve the locator into a track or a playlist.
    async fn load(&self, locator: &str) -> Result<LoadResult, ResolutionError>;

    /// Sources without a catalogue find nothing.
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchCandidate>, ResolutionError> {
        Ok(Vec::new())
    }
}

pub type BoxedSource = Box<dyn SourcePlugin>;

/// What the player needs from track resolution. May suspend on I/O; never
/// returns a partially populated track.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, locator: &str) -> Result<LoadResult, ResolutionError>;

    /// At most `limit` candidates, best first. No candidates is an error.
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchCandidate>, ResolutionError>;
}
