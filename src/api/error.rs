use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::SbError;

/// [`SbError`] rendered as `{"detail", "code", "status"}`.
#[derive(Debug)]
pub struct ApiError(pub SbError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<SbError> for ApiError {
    fn from(err: SbError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = %code, "request failed");
        } else {
            tracing::debug!(error = %self.0, code = %code, "request rejected");
        }

        let body = Json(json!({
            "detail": self.0.to_string(),
            "code": code,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_error_code() {
        let response = ApiError(SbError::NotFound("Deal not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(SbError::InvalidStatus("Invalid status".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(SbError::Llm("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ApiError(SbError::Internal("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
