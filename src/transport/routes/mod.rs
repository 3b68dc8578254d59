pub mod info;
pub mod messages;
pub mod player;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::common::errors::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
