use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{info, messages, player},
        websocket_server,
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/guilds/{guild_id}/play", post(player::play))
        .route("/guilds/{guild_id}/select", post(player::select))
        .route("/guilds/{guild_id}/skip", post(player::skip))
        .route("/guilds/{guild_id}/pause", post(player::pause))
        .route("/guilds/{guild_id}/resume", post(player::resume))
        .route("/guilds/{guild_id}/toggle", post(player::toggle))
        .route("/guilds/{guild_id}/stop", post(player::stop))
        .route("/guilds/{guild_id}/disconnect", post(player::disconnect))
        .route("/guilds/{guild_id}/queue", get(player::queue))
        .route("/guilds/{guild_id}/voice/closed", post(player::voice_closed))
        .route("/messages/{message_id}", delete(messages::delete_message))
        .route("/events", get(websocket_server::events_handler));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
