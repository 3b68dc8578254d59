use std::path::{Path, PathBuf};

use async_trait::async_trait;
use symphonia::core::{
    codecs::CODEC_TYPE_NULL,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::{MetadataOptions, StandardTagKey},
    probe::Hint,
};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    common::{errors::ResolutionError, types::AnyResult},
    protocol::tracks::{LoadResult, SearchCandidate, StreamSource, Track, TrackInfo},
    sources::plugin::SourcePlugin,
};

const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "alac", "flac", "m4a", "mka", "mkv", "mp3", "mp4", "oga", "ogg", "opus", "wav", "webm",
];

/// Files under a library root: `file://` locators, directories as
/// playlists, and search. Paths outside the root are refused.
pub struct LocalSource {
    library: PathBuf,
}

impl LocalSource {
    pub fn new(library: impl Into<PathBuf>) -> AnyResult<Self> {
        let library = library.into();
        if library.exists() && !library.is_dir() {
            return Err(format!("{} is not a directory", library.display()).into());
        }
        Ok(Self { library })
    }

    fn is_audio_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    }

    fn probe_file(path: &Path) -> AnyResult<TrackInfo> {
        let file = std::fs::File::open(path)?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(&ext.to_lowercase());
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or("no audio track found")?;

        let duration_secs = match (track.codec_params.n_frames, track.codec_params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some((frames as f64 / rate as f64).round() as u64),
            _ => None,
        };

        let mut title = None;
        let mut author = None;
        if let Some(meta) = format.metadata().current() {
            for tag in meta.tags() {
                match tag.std_key {
                    Some(StandardTagKey::TrackTitle) => title = Some(tag.value.to_string()),
                    Some(StandardTagKey::Artist) | Some(StandardTagKey::AlbumArtist) => {
                        author.get_or_insert_with(|| tag.value.to_string());
                    }
                    _ => {}
                }
            }
        }

        Ok(TrackInfo {
            identifier: format!("file://{}", path.display()),
            title: title.unwrap_or_else(|| file_stem(path)),
            author,
            duration_secs,
            source_name: "local".to_string(),
        })
    }

    fn load_file(path: &Path) -> Result<Track, ResolutionError> {
        match Self::probe_file(path) {
            Ok(info) => Ok(Track::new(info, StreamSource::File(path.to_path_buf()))),
            Err(e) => {
                warn!("Local source: failed to probe '{}': {}", path.display(), e);
                Err(ResolutionError::Unsupported(format!("{}: {}", path.display(), e)))
            }
        }
    }

    /// Resolves `path` to its canonical form and refuses anything that
    /// lands outside the library root.
    fn confine(library: &Path, path: &Path) -> Result<PathBuf, ResolutionError> {
        let canonical = path.canonicalize().map_err(|e| ResolutionError::Unreachable {
            locator: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let outside = || ResolutionError::Unsupported(format!("{} is outside the music library", path.display()));

        let root = library.canonicalize().map_err(|_| outside())?;
        if !canonical.starts_with(&root) {
            return Err(outside());
        }
        Ok(canonical)
    }

    fn load_path(library: &Path, path: &Path) -> Result<LoadResult, ResolutionError> {
        let path = &Self::confine(library, path)?;

        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(|e| ResolutionError::Unreachable {
                    locator: path.display().to_string(),
                    reason: e.to_string(),
                })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| Self::is_audio_file(p))
                .filter_map(|p| Self::confine(library, &p).ok())
                .collect();
            files.sort();

            if files.is_empty() {
                return Err(ResolutionError::Empty(path.display().to_string()));
            }

            return Ok(LoadResult::Playlist {
                name: file_stem(path),
                entries: files.iter().map(|f| Self::load_file(f)).collect(),
            });
        }

        if path.is_file() {
            return Self::load_file(path).map(LoadResult::Track);
        }

        Err(ResolutionError::Unreachable {
            locator: path.display().to_string(),
            reason: "no such file or directory".to_string(),
        })
    }

    fn search_library(library: &Path, query: &str, limit: usize) -> Vec<SearchCandidate> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<PathBuf> = WalkDir::new(library)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| Self::is_audio_file(p))
            .filter(|p| {
                let stem = file_stem(p).to_lowercase();
                terms.iter().all(|t| stem.contains(t.as_str()))
            })
            .collect();
        hits.sort();

        hits.into_iter()
            .take(limit)
            .map(|p| SearchCandidate {
                title: file_stem(&p),
                locator: format!("file://{}", p.canonicalize().unwrap_or(p).display()),
            })
            .collect()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

#[async_trait]
impl SourcePlugin for LocalSource {
    fn name(&self) -> &str {
        "local"
    }

    fn can_handle(&self, locator: &str) -> bool {
        locator.trim().starts_with("file://")
    }

    async fn load(&self, locator: &str) -> Result<LoadResult, ResolutionError> {
        let path = PathBuf::from(locator.trim().trim_start_matches("file://"));
        debug!("Local source loading: {}", path.display());

        let display = path.display().to_string();
        let library = self.library.clone();
        tokio::task::spawn_blocking(move || LocalSource::load_path(&library, &path))
            .await
            .map_err(|e| ResolutionError::Unreachable {
                locator: display,
                reason: e.to_string(),
            })?
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, ResolutionError> {
        if !self.library.is_dir() {
            return Ok(Vec::new());
        }

        let library = self.library.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || LocalSource::search_library(&library, &query, limit))
            .await
            .map_err(|e| ResolutionError::Unreachable {
                locator: "local library".to_string(),
                reason: e.to_string(),
            })
    }
}
