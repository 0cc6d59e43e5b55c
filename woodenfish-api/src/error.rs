/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `ApiResult<T>`, so `?` on database, password and
/// validation errors produces the right status code.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "bad_request", "detail": "用户名已存在" }
/// ```
///
/// # Example
///
/// ```no_run
/// use woodenfish_api::error::{ApiError, ApiResult, messages};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound(messages::USER_NOT_FOUND.to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use woodenfish_shared::models::user::{EMAIL_CONSTRAINT, PHONE_CONSTRAINT, USERNAME_CONSTRAINT};

/// Client-facing messages
pub mod messages {
    pub const USERNAME_TAKEN: &str = "用户名已存在";
    pub const EMAIL_TAKEN: &str = "邮箱已注册";
    pub const PHONE_TAKEN: &str = "手机号已注册";
    pub const USER_NOT_FOUND: &str = "用户不存在";
    pub const STATS_NOT_FOUND: &str = "统计数据不存在";
    pub const ACHIEVEMENT_NOT_FOUND: &str = "成就不存在";
    pub const SHARE_TASK_NOT_FOUND: &str = "分享任务不存在";
    pub const INVALID_PHONE: &str = "手机号格式不正确";
    pub const INVALID_CODE: &str = "验证码无效或已过期";
    pub const RESOURCE_NOT_FOUND: &str = "资源不存在";
}

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): duplicates, malformed phone, bad code
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub detail: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, detail, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            detail,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound(messages::RESOURCE_NOT_FOUND.to_string()),
            sqlx::Error::Database(db_err) => {
                // A uniqueness race that slipped past the handler's own check
                if db_err.is_unique_violation() {
                    let message = match db_err.constraint() {
                        Some(USERNAME_CONSTRAINT) => Some(messages::USERNAME_TAKEN),
                        Some(EMAIL_CONSTRAINT) => Some(messages::EMAIL_TAKEN),
                        Some(PHONE_CONSTRAINT) => Some(messages::PHONE_TAKEN),
                        _ => None,
                    };
                    if let Some(message) = message {
                        return ApiError::BadRequest(message.to_string());
                    }
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(errors)
    }
}

/// Convert password errors to API errors
impl From<woodenfish_shared::auth::password::PasswordError> for ApiError {
    fn from(err: woodenfish_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest(messages::INVALID_PHONE.to_string());
        assert_eq!(err.to_string(), "Bad request: 手机号格式不正确");

        let err = ApiError::NotFound(messages::USER_NOT_FOUND.to_string());
        assert_eq!(err.to_string(), "Not found: 用户不存在");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ApiError::BadRequest(messages::USERNAME_TAKEN.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "bad_request");
        assert_eq!(json["detail"], "用户名已存在");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::InternalError("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert!(!json["detail"].as_str().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
