use serde::Serialize;
use thiserror::Error;

use crate::common::types::now_ms;

/// The command was rejected before touching any session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("join a voice channel to use music commands")]
    NotInVoice,
    #[error("the bot is not connected to a voice channel")]
    NotConnected,
    #[error("nothing is playing")]
    NothingPlaying,
    #[error("playback is not paused")]
    NotPaused,
    #[error("playback is already paused")]
    AlreadyPaused,
    #[error("no pending search to choose from")]
    NoPendingSelection,
    #[error("that search has expired, search again")]
    SelectionExpired,
    #[error("that choice is not part of the search results")]
    UnknownChoice,
}

/// A locator or search text could not be turned into playable tracks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("could not reach {locator}: {reason}")]
    Unreachable { locator: String, reason: String },
    #[error("no results for \"{0}\"")]
    NoMatches(String),
    #[error("unsupported source: {0}")]
    Unsupported(String),
    #[error("nothing playable found at {0}")]
    Empty(String),
}

/// Connecting to voice or starting a stream failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("voice connection failed: {0}")]
    Connect(String),
    #[error("stream could not be started: {0}")]
    Start(String),
    #[error("voice connection is closed")]
    Closed,
}

/// A rendered message could not be updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("message not found")]
    NotFound,
}

/// Error returned by every control surface command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("something went wrong, try again")]
    Internal(String),
}

impl CommandError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Resolution(_) => 404,
            Self::Transport(_) => 502,
            Self::Internal(_) => 500,
        }
    }
}

/// JSON error response format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status reason phrase (e.g. "Bad Request").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// The request path that caused the error.
    pub path: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>, path: impl Into<String>) -> Self {
        let error = match status {
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            502 => "Bad Gateway",
            _ => "Internal Server Error",
        };
        Self {
            timestamp: now_ms(),
            status,
            error: error.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn from_command(err: &CommandError, path: impl Into<String>) -> Self {
        Self::new(err.status(), err.to_string(), path)
    }
}
