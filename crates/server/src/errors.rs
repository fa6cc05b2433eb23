use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use service::experts::errors::ExpertError;

/// HTTP translation of service-layer errors. Controllers hand errors back
/// unchanged; the mapping to response codes lives here.
#[derive(Debug)]
pub struct ApiError(pub ExpertError);

impl From<ExpertError> for ApiError {
    fn from(e: ExpertError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ExpertError::NotFound(_) => StatusCode::NOT_FOUND,
            ExpertError::Validation(_) | ExpertError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ExpertError::Conflict => StatusCode::CONFLICT,
            ExpertError::HashError(_) | ExpertError::Repository(_) => {
                error!(code = self.0.code(), error = %self.0, "internal service error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}
