/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: JWT access/refresh token issuing and validation
/// - [`middleware`]: Bearer token parsing into an [`middleware::AuthContext`]
/// - [`authorization`]: Role and ownership checks
///
/// # Example
///
/// ```no_run
/// use tshare_shared::auth::password::{hash_password, verify_password};
/// use tshare_shared::auth::jwt::{create_token, Claims, TokenType};
/// use tshare_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
