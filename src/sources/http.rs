use async_trait::async_trait;
use reqwest::{
    Url,
    header::{CONTENT_TYPE, HeaderMap},
};
use tracing::debug;

use crate::{
    common::{errors::ResolutionError, http::HttpClient},
    protocol::tracks::{LoadResult, StreamSource, Track, TrackInfo},
    sources::{locator::is_http_url, plugin::SourcePlugin},
};

/// HTTP/HTTPS Source Plugin
///
/// Handles direct audio stream URLs and `.m3u` playlists of them.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }

    fn is_valid_content_type(content_type: &str) -> bool {
        content_type.starts_with("audio/")
            || content_type.starts_with("video/")
            || content_type == "application/octet-stream"
            || content_type == "application/ogg"
            || content_type.is_empty()
    }

    fn is_playlist(url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
        path.ends_with(".m3u") || path.ends_with(".m3u8")
    }

    async fn load_single(&self, url: &str) -> Result<Track, ResolutionError> {
        let unreachable = |reason: String| ResolutionError::Unreachable {
            locator: url.to_string(),
            reason,
        };

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !Self::is_valid_content_type(&content_type) {
            return Err(ResolutionError::Unsupported(content_type));
        }

        Ok(Track::new(
            extract_metadata(url, headers),
            StreamSource::Http(url.to_string()),
        ))
    }

    async fn load_playlist(&self, url: &str) -> Result<LoadResult, ResolutionError> {
        let unreachable = |reason: String| ResolutionError::Unreachable {
            locator: url.to_string(),
            reason,
        };

        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| unreachable(e.to_string()))?
            .text()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let entries = parse_m3u(url, &body);
        if entries.is_empty() {
            return Err(ResolutionError::Empty(url.to_string()));
        }
        debug!("playlist {} has {} entries", url, entries.len());

        let entries =
            futures::future::join_all(entries.iter().map(|entry| self.load_single(entry))).await;

        Ok(LoadResult::Playlist {
            name: title_from_url(url),
            entries,
        })
    }
}

#[async_trait]
impl SourcePlugin for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn can_handle(&self, locator: &str) -> bool {
        is_http_url(locator)
    }

    async fn load(&self, locator: &str) -> Result<LoadResult, ResolutionError> {
        let locator = locator.trim();
        if Self::is_playlist(locator) {
            return self.load_playlist(locator).await;
        }
        self.load_single(locator).await.map(LoadResult::Track)
    }
}

fn title_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|s| s.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("Audio Stream")
        .to_string()
}

fn extract_metadata(url: &str, headers: &HeaderMap) -> TrackInfo {
    let title = headers
        .get("icy-name")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("content-disposition")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split("filename=\"").nth(1))
                .and_then(|s| s.split('"').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| title_from_url(url));

    let author = headers
        .get("icy-description")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    // A HEAD response carries no reliable playing time.
    TrackInfo {
        identifier: url.to_string(),
        title,
        author,
        duration_secs: None,
        source_name: "http".to_string(),
    }
}

/// Entry URLs of an M3U body in order; relative entries resolve against `base`.
fn parse_m3u(base: &str, body: &str) -> Vec<String> {
    let base = Url::parse(base).ok();
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match &base {
            Some(base) => base.join(line).ok().map(String::from),
            None => Url::parse(line).ok().map(String::from),
        })
        .collect()
}
