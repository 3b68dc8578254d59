use std::{future::Future, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use tracing::error;

use crate::{
    common::{
        errors::{ApiError, CommandError},
        types::{Actor, GuildId},
    },
    player::{EnqueueReport, PlayOutcome, Toggled},
    protocol::{
        content::QueueView,
        models::{ActorRequest, PlayRequest, SelectRequest},
        tracks::TrackInfo,
    },
    server::AppState,
};

/// Runs a command on its own task so a panic inside it becomes a generic
/// error response instead of tearing down the connection.
async fn execute<T, F>(path: String, command: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, CommandError>> + Send + 'static,
{
    let result = match tokio::spawn(command).await {
        Ok(result) => result,
        Err(e) => {
            error!("command {} aborted: {}", path, e);
            Err(CommandError::Internal(e.to_string()))
        }
    };
    result.map_err(|e| ApiError::from_command(&e, path))
}

/// The guild in the path wins over whatever the body claims.
fn scoped(mut actor: Actor, guild_id: GuildId) -> Actor {
    actor.guild_id = guild_id;
    actor
}

/// POST /v1/guilds/{guildId}/play
pub async fn play(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayRequest>,
) -> Result<Json<PlayOutcome>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/play \"{}\"", guild_id, body.query);
    let actor = scoped(body.actor, guild_id);
    let query = body.query;

    let outcome = execute(format!("/v1/guilds/{}/play", guild_id), async move {
        state.control.play(&actor, &query).await
    })
    .await?;
    Ok(Json(outcome))
}

/// POST /v1/guilds/{guildId}/select
pub async fn select(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<EnqueueReport>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/select prompt={}", guild_id, body.prompt_id);
    let actor = scoped(body.actor, guild_id);
    let (prompt_id, locator) = (body.prompt_id, body.locator);

    let report = execute(format!("/v1/guilds/{}/select", guild_id), async move {
        state.control.select(&actor, prompt_id, &locator).await
    })
    .await?;
    Ok(Json(report))
}

/// POST /v1/guilds/{guildId}/skip
pub async fn skip(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<TrackInfo>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/skip", guild_id);
    let actor = scoped(body.actor, guild_id);

    let skipped = execute(format!("/v1/guilds/{}/skip", guild_id), async move {
        state.control.skip(&actor).await
    })
    .await?;
    Ok(Json(skipped))
}

/// POST /v1/guilds/{guildId}/pause
pub async fn pause(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<TrackInfo>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/pause", guild_id);
    let actor = scoped(body.actor, guild_id);

    let paused = execute(format!("/v1/guilds/{}/pause", guild_id), async move {
        state.control.pause(&actor).await
    })
    .await?;
    Ok(Json(paused))
}

/// POST /v1/guilds/{guildId}/resume
pub async fn resume(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<TrackInfo>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/resume", guild_id);
    let actor = scoped(body.actor, guild_id);

    let resumed = execute(format!("/v1/guilds/{}/resume", guild_id), async move {
        state.control.resume(&actor).await
    })
    .await?;
    Ok(Json(resumed))
}

/// POST /v1/guilds/{guildId}/toggle
///
/// The play/pause button on the now-playing card.
pub async fn toggle(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<Toggled>, ApiError> {
    tracing::info!("POST /v1/guilds/{}/toggle", guild_id);
    let actor = scoped(body.actor, guild_id);

    let toggled = execute(format!("/v1/guilds/{}/toggle", guild_id), async move {
        state.control.toggle(&actor).await
    })
    .await?;
    Ok(Json(toggled))
}

/// POST /v1/guilds/{guildId}/stop
pub async fn stop(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("POST /v1/guilds/{}/stop", guild_id);
    let actor = scoped(body.actor, guild_id);

    execute(format!("/v1/guilds/{}/stop", guild_id), async move {
        state.control.stop(&actor).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/guilds/{guildId}/disconnect
pub async fn disconnect(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("POST /v1/guilds/{}/disconnect", guild_id);
    let actor = scoped(body.actor, guild_id);

    execute(format!("/v1/guilds/{}/disconnect", guild_id), async move {
        state.control.disconnect(&actor).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/guilds/{guildId}/queue
pub async fn queue(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Json<QueueView> {
    tracing::debug!("GET /v1/guilds/{}/queue", guild_id);
    Json(state.control.queue(guild_id).await)
}

/// POST /v1/guilds/{guildId}/voice/closed
///
/// Called by the bot when the voice connection was torn down from outside.
pub async fn voice_closed(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Json<Value> {
    tracing::info!("POST /v1/guilds/{}/voice/closed", guild_id);
    let cleared = state.control.voice_closed(guild_id).await;
    Json(json!({ "cleared": cleared }))
}
