/// Authorization helpers and permission checks
///
/// # Permission Model
///
/// 1. **Authenticated**: every `/api` route except auth and config needs a
///    valid access token
/// 2. **Admin role**: user management, the dashboard, export/import and
///    OAuth settings need `UserRole::Admin`
/// 3. **Ownership**: templates, projects and variables can be changed by the
///    user who created them, or by an admin
///
/// # Example
///
/// ```
/// use tshare_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use tshare_shared::auth::middleware::AuthContext;
/// use tshare_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), role: UserRole::User };
/// assert!(require_admin(&auth).is_err());
/// assert!(require_owner_or_admin(&auth, Some(auth.user_id)).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User doesn't have required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller to be an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: auth.role,
        })
    }
}

/// Requires the caller to own the resource, or be an admin
///
/// `owner` is `None` when the owning user has been deleted; only admins can
/// touch orphaned resources.
pub fn require_owner_or_admin(auth: &AuthContext, owner: Option<Uuid>) -> Result<(), AuthzError> {
    if auth.is_admin() || owner == Some(auth.user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ctx(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&ctx(UserRole::Admin)).is_ok());
        assert_matches!(
            require_admin(&ctx(UserRole::User)),
            Err(AuthzError::InsufficientRole {
                required: UserRole::Admin,
                actual: UserRole::User
            })
        );
    }

    #[test]
    fn test_require_owner_or_admin() {
        let user = ctx(UserRole::User);
        let admin = ctx(UserRole::Admin);
        let other = Uuid::new_v4();

        assert!(require_owner_or_admin(&user, Some(user.user_id)).is_ok());
        assert_matches!(
            require_owner_or_admin(&user, Some(other)),
            Err(AuthzError::NotAuthorized)
        );
        assert_matches!(
            require_owner_or_admin(&user, None),
            Err(AuthzError::NotAuthorized)
        );
        assert!(require_owner_or_admin(&admin, Some(other)).is_ok());
        assert!(require_owner_or_admin(&admin, None).is_ok());
    }
}
