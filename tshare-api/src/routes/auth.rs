/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account (pending approval)
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Refresh access token
/// - `GET  /api/auth/me` - Current user's profile
/// - `PUT  /api/auth/password` - Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use tshare_shared::{
    auth::{
        jwt::{self, Claims, TokenPair, TokenType},
        middleware::AuthContext,
        password,
    },
    models::user::{User, UserProfile, UserStatus},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Register response
///
/// Tokens are only issued when the account is active right away, which is
/// the case for the very first account (bootstrap admin).
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,

    #[serde(flatten)]
    pub tokens: Option<TokenPair>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Only active accounts may log in or call the API
pub(crate) fn ensure_active(user: &User) -> ApiResult<()> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Pending => Err(ApiError::Forbidden(
            "Account is awaiting approval".to_string(),
        )),
        UserStatus::Suspended => Err(ApiError::Forbidden("Account is suspended".to_string())),
    }
}

fn check_password_strength(field: &str, candidate: &str) -> ApiResult<()> {
    password::validate_password_strength(candidate).map_err(|e| ApiError::invalid_field(field, e))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123",
///   "name": "Sato"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    check_password_strength("password", &req.password)?;

    let password_hash = password::hash_password(&req.password)?;
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let user = User::register(&state.db, req.email.trim(), &password_hash, name).await?;

    info!(user_id = %user.id, role = user.role.as_str(), status = user.status.as_str(), "User registered");

    let tokens = if user.status == UserStatus::Active {
        Some(jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            tokens,
        }),
    ))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `403 Forbidden`: Account pending approval or suspended
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    ensure_active(&user)?;

    User::update_last_login(&state.db, user.id).await?;

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: user.into(),
        tokens,
    }))
}

/// Token refresh endpoint
///
/// The new access token carries the user's current role, so role changes
/// take effect on the next refresh.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or deleted account
/// - `403 Forbidden`: Account no longer active
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    ensure_active(&user)?;

    let access_token = jwt::create_token(
        &Claims::new(user.id, user.role, TokenType::Access),
        state.jwt_secret(),
    )?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Change own password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: New password too weak
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    check_password_strength("new_password", &req.new_password)?;

    let hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tshare_shared::models::user::UserRole;
    use uuid::Uuid;

    fn user(status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            email: "sato@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            role: UserRole::User,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_only_active_accounts_may_log_in() {
        assert!(ensure_active(&user(UserStatus::Active)).is_ok());

        let err = ensure_active(&user(UserStatus::Pending)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("awaiting approval"));

        let err = ensure_active(&user(UserStatus::Suspended)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_response_omits_tokens_for_pending() {
        let json = serde_json::to_value(RegisterResponse {
            user: user(UserStatus::Pending).into(),
            tokens: None,
        })
        .unwrap();
        assert!(json.get("access_token").is_none());
        assert_eq!(json["user"]["status"], "pending");
    }
}
