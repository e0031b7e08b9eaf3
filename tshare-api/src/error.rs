/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts to
/// the appropriate status code and a JSON body:
///
/// ```json
/// { "error": "not_found", "message": "Template not found" }
/// ```
///
/// # Example
///
/// ```
/// use tshare_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Template not found".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use tshare_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    transfer::TransferError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate name or email, or a broken reference
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Body over the route's limit, e.g. an oversized import file
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// 422 with one entry per failing field
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Logged, never shown to the client
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Shorthand for a single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    /// Prefixes the message with where the failure happened
    ///
    /// Validation details are left as they are.
    pub fn with_context(self, context: &str) -> Self {
        let wrap = |msg: String| format!("{}: {}", context, msg);
        match self {
            ApiError::BadRequest(msg) => ApiError::BadRequest(wrap(msg)),
            ApiError::Unauthorized(msg) => ApiError::Unauthorized(wrap(msg)),
            ApiError::Forbidden(msg) => ApiError::Forbidden(wrap(msg)),
            ApiError::NotFound(msg) => ApiError::NotFound(wrap(msg)),
            ApiError::Conflict(msg) => ApiError::Conflict(wrap(msg)),
            ApiError::PayloadTooLarge(msg) => ApiError::PayloadTooLarge(wrap(msg)),
            ApiError::InternalError(msg) => ApiError::InternalError(wrap(msg)),
            ApiError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(wrap(msg)),
            ApiError::ValidationError(details) => ApiError::ValidationError(details),
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Human message for a violated constraint
fn constraint_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("uq_users_email") => "Email already exists".to_string(),
        Some("scenes_name_key") => "A scene with this name already exists".to_string(),
        Some("tags_name_key") => "A tag with this name already exists".to_string(),
        Some(c) if c.ends_with("_name_key") => "A variable with this name already exists".to_string(),
        Some(c) => format!("Constraint violation: {}", c),
        None => "Constraint violation".to_string(),
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    ApiError::Conflict(constraint_message(db_err.constraint()))
                }
                ErrorKind::ForeignKeyViolation => ApiError::Conflict(format!(
                    "Referenced record does not exist ({})",
                    db_err.constraint().unwrap_or("foreign key")
                )),
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    ApiError::Conflict(constraint_message(db_err.constraint()))
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database is busy, try again later".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::InsufficientRole { .. } => {
                ApiError::Forbidden("Admin role required".to_string())
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Failed to create token: {}", msg))
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert export/import errors to API errors
impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidEnvelope(_)
            | TransferError::UnsupportedVersion(_)
            | TransferError::RowDecode { .. } => ApiError::BadRequest(err.to_string()),
            TransferError::RowInsert {
                table,
                index,
                source,
            } => {
                tracing::warn!(table, index, error = %source, "Import row rejected");
                let context = format!("Failed to import row {} of {}", index, table);
                // Values the database refused are a client error
                let rejected_row = matches!(source, sqlx::Error::Database(_));
                match ApiError::from(source) {
                    ApiError::InternalError(msg) if rejected_row => {
                        ApiError::BadRequest(format!("{}: {}", context, msg))
                    }
                    other => other.with_context(&context),
                }
            }
            TransferError::Database(source) => ApiError::from(source),
        }
    }
}

/// Convert validator errors to a 422 with per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    ValidationErrorDetail::new(
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    )
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::to_bytes;
    use tshare_shared::models::user::UserRole;
    use validator::Validate;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail::new("email", "Invalid email format"),
            ValidationErrorDetail::new("password", "Password too short"),
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[tokio::test]
    async fn test_response_shape() {
        let (status, body) = body_json(ApiError::NotFound("Template not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Template not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_is_not_exposed() {
        let (status, body) =
            body_json(ApiError::InternalError("connection refused on 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_validator_errors_become_details() {
        #[derive(Validate)]
        struct Input {
            #[validate(email(message = "Invalid email format"))]
            email: String,
            #[validate(length(min = 1, message = "Name is required"))]
            name: String,
        }

        let err: ApiError = Input {
            email: "nope".to_string(),
            name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "email");
        assert_eq!(body["details"][1]["message"], "Name is required");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_authz_maps_to_403() {
        let err: ApiError = AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: UserRole::User,
        }
        .into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: ApiError = AuthzError::NotAuthorized.into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_errors() {
        let err: ApiError = AuthError::MissingCredentials.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = AuthError::InvalidFormat("Expected Bearer token".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transfer_errors() {
        let err: ApiError = TransferError::InvalidEnvelope(vec![
            "data.tags is missing".to_string(),
            "data.users is not an array".to_string(),
        ])
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("data.tags is missing"));
        assert!(err.to_string().contains("data.users is not an array"));

        let err: ApiError = TransferError::UnsupportedVersion("2.0".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = TransferError::RowDecode {
            table: "tags",
            index: 3,
            message: "missing field `name`".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("row 3 in tags"));
    }

    #[test]
    fn test_constraint_messages() {
        assert_eq!(constraint_message(Some("uq_users_email")), "Email already exists");
        assert_eq!(
            constraint_message(Some("user_variables_user_id_name_key")),
            "A variable with this name already exists"
        );
        assert_eq!(
            constraint_message(Some("uq_documents_personal_memo")),
            "Constraint violation: uq_documents_personal_memo"
        );
    }

    #[test]
    fn test_row_insert_keeps_table_and_index() {
        let err: ApiError = TransferError::RowInsert {
            table: "templates",
            index: 4,
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        assert_matches!(
            &err,
            ApiError::ServiceUnavailable(msg) if msg.starts_with("Failed to import row 4 of templates: ")
        );

        let err: ApiError = TransferError::RowInsert {
            table: "documents",
            index: 0,
            source: sqlx::Error::Protocol("unexpected message".to_string()),
        }
        .into();
        assert_matches!(&err, ApiError::InternalError(msg) if msg.contains("row 0 of documents"));
    }

    #[test]
    fn test_with_context_leaves_validation_details() {
        let err = ApiError::invalid_field("name", "Name is required").with_context("row 1 of tags");
        assert_matches!(err, ApiError::ValidationError(details) if details[0].field == "name");

        let err = ApiError::NotFound("Scene not found".to_string()).with_context("row 2 of templates");
        assert_eq!(err.to_string(), "Not found: row 2 of templates: Scene not found");
    }
}
