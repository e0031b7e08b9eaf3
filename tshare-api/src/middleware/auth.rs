/// Authentication middleware layers
///
/// `jwt_auth_layer` validates the bearer access token, then loads the account
/// it names. The caller's [`AuthContext`] is built from that row, so a
/// suspension, deletion or role change applies to tokens already issued.
/// `admin_only_layer` sits inside it and rejects non-admin callers with 403.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tshare_shared::{
    auth::{
        authorization::require_admin,
        middleware::{authenticate, AuthContext},
    },
    models::user::User,
};

use crate::{app::AppState, error::ApiError, routes::auth::ensure_active};

/// JWT authentication middleware layer
///
/// 401 when the token is invalid or its account is gone, 403 when the
/// account is pending or suspended.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claimed = authenticate(req.headers(), state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claimed.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if let Err(err) = ensure_active(&user) {
        tracing::warn!(user_id = %user.id, status = user.status.as_str(), "Token used by inactive account");
        return Err(err);
    }

    req.extensions_mut().insert(AuthContext {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

/// Admin gate, must run after [`jwt_auth_layer`]
pub async fn admin_only_layer(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    if let Err(err) = require_admin(&auth) {
        tracing::warn!(user_id = %auth.user_id, path = %req.uri().path(), "Admin route denied");
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
