use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    common::{errors::ApiError, types::MessageId},
    server::AppState,
};

/// DELETE /v1/messages/{message_id}
///
/// Later progress updates for the message fail with `NotFound`, which ends
/// the reporter that owned it.
pub async fn delete_message(
    Path(message_id): Path<MessageId>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("DELETE /v1/messages/{}", message_id);
    if state.board.delete(message_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            404,
            format!("Message not found: {}", message_id),
            format!("/v1/messages/{}", message_id),
        ))
    }
}
