use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stagelink_db::StoreError;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// The single error surface of the HTTP layer: a status code and a
/// user-facing message, rendered as `{"error": "..."}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid credentials".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(what) => Self {
                status: StatusCode::BAD_REQUEST,
                message: format!("invalid {}", what),
            },
            // Denied and absent are deliberately the same response.
            StoreError::NotFound => Self::not_found(),
            StoreError::Forbidden(msg) => Self {
                status: StatusCode::FORBIDDEN,
                message: msg.to_string(),
            },
            StoreError::Conflict(msg) => Self {
                status: StatusCode::CONFLICT,
                message: msg,
            },
            StoreError::Internal(_) | StoreError::Db(_) => {
                error!("store failure: {}", err);
                Self::internal()
            }
        }
    }
}
