use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::server::AppState;

pub const API_VERSION_HEADER: &str = "Melodeck-Api-Version";

/// Guild segment of a `/v1/guilds/{guild_id}/...` path.
fn guild_of(path: &str) -> Option<&str> {
    path.strip_prefix("/v1/guilds/")?
        .split('/')
        .next()
        .filter(|id| !id.is_empty())
}

/// Rejects requests whose `Authorization` header is not the configured password.
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let supplied = req.headers().get("authorization").and_then(|h| h.to_str().ok());
    if supplied == Some(state.config.server.password.as_str()) {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    let reason = if supplied.is_some() { "wrong password" } else { "no Authorization header" };
    match guild_of(path) {
        Some(guild_id) => warn!("[{}] rejected {} {}: {}", guild_id, req.method(), path, reason),
        None => warn!("rejected {} {}: {}", req.method(), path, reason),
    }
    Err(StatusCode::UNAUTHORIZED)
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static("1"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_is_read_from_player_paths_only() {
        assert_eq!(guild_of("/v1/guilds/42/play"), Some("42"));
        assert_eq!(guild_of("/v1/guilds/42"), Some("42"));
        assert_eq!(guild_of("/v1/guilds/"), None);
        assert_eq!(guild_of("/v1/messages/7"), None);
        assert_eq!(guild_of("/version"), None);
    }
}
