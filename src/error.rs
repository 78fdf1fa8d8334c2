use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bindings::BindingError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Browser binding error: {0}")]
    Browser(#[source] BindingError),

    #[error("Generation binding error: {0}")]
    Generation(#[source] BindingError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not Found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Browser(_) | ServerError::Generation(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Browser(_) => "BROWSER_ERROR",
            ServerError::Generation(_) => "GENERATION_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Internal(format!("JSON error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServerError::BadRequest("Missing 'url'".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServerError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::Browser(BindingError::Navigation("boom".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServerError::Config("missing api token".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_has_error_key() {
        let response = ServerError::BadRequest("Missing 'url'".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
