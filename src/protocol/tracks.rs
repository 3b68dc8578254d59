use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::common::{errors::ResolutionError, types::Requester};

/// Track metadata as produced by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Locator the track was resolved from.
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// `None` for live streams and sources that do not report a length.
    #[serde(default)]
    pub duration_secs: Option<u64>,
    pub source_name: String,
}

impl TrackInfo {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

/// Where the transport reads audio bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    Http(String),
    File(PathBuf),
}

/// Opaque stream handed to the voice transport when the track starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    source: Arc<StreamSource>,
    duration_hint: Option<Duration>,
}

impl StreamHandle {
    pub fn new(source: StreamSource, duration_hint: Option<Duration>) -> Self {
        Self {
            source: Arc::new(source),
            duration_hint,
        }
    }

    pub fn source(&self) -> &StreamSource {
        &self.source
    }

    pub fn duration_hint(&self) -> Option<Duration> {
        self.duration_hint
    }
}

/// A resolved, playable track. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub info: TrackInfo,
    pub stream: StreamHandle,
}

impl Track {
    pub fn new(info: TrackInfo, source: StreamSource) -> Self {
        let stream = StreamHandle::new(source, info.duration());
        Self { info, stream }
    }
}

/// A track waiting in a session queue together with who asked for it.
#[derive(Debug, Clone)]
pub struct QueuedTrack {
    pub track: Track,
    pub requester: Requester,
}

/// Outcome of resolving a locator.
#[derive(Debug, Clone)]
pub enum LoadResult {
    Track(Track),
    /// Entries keep their playlist order; each one resolves or fails on its own.
    Playlist {
        name: String,
        entries: Vec<Result<Track, ResolutionError>>,
    },
}

impl LoadResult {
    /// Splits into playable tracks (order kept) and the entries that failed.
    pub fn into_parts(self) -> (Vec<Track>, Vec<ResolutionError>) {
        match self {
            Self::Track(track) => (vec![track], Vec::new()),
            Self::Playlist { entries, .. } => {
                let mut tracks = Vec::with_capacity(entries.len());
                let mut failed = Vec::new();
                for entry in entries {
                    match entry {
                        Ok(track) => tracks.push(track),
                        Err(e) => failed.push(e),
                    }
                }
                (tracks, failed)
            }
        }
    }
}

/// One search hit offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    pub title: String,
    pub locator: String,
}
