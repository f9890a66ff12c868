//! Error rendering.
//!
//! Every failure leaves as HTTP 500 with a Rosetta error body, including
//! request bodies that fail to decode.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::construction::ConstructionError;

pub type ApiResult<T> = Result<Json<T>, ConstructionError>;

impl IntoResponse for ConstructionError {
    fn into_response(self) -> Response {
        if self.retriable() {
            tracing::warn!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.to_rosetta())).into_response()
    }
}

impl From<JsonRejection> for ConstructionError {
    fn from(rejection: JsonRejection) -> Self {
        ConstructionError::InvalidRequest(rejection.body_text())
    }
}
