//! # Authentication
//!
//! Session tokens, password hashing and the [`AuthUser`] extractor.
//!
//! ```text
//!  POST /api/auth/login ──► verify argon2 hash ──► JwtManager::issue
//!                                                       │
//!                          Set-Cookie: token=<jwt>; HttpOnly; Path=/
//!                                                       │
//!  any /api request ──► cookie `token` (or Authorization: Bearer)
//!                            │
//!                            ▼
//!                  JwtManager::verify ──► load user (must be active) ──► AuthUser
//! ```
//!
//! Roles are re-read from the database on every request, so deactivating a
//! user or lowering their role takes effect before the token expires.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use gestor_core::{Role, User};

// =============================================================================
// JWT
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// HS256 token manager.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issues a session token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validates signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ApiError::Unauthenticated("Invalid or expired session".to_string())
            })
    }
}

// =============================================================================
// Passwords
// =============================================================================

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// `false` for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub branch_id: Option<String>,
}

impl AuthUser {
    /// `ADMIN` or `SUPERADMIN`.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator role required".to_string()))
        }
    }

    pub fn require_superadmin(&self) -> Result<(), ApiError> {
        if self.role.is_superadmin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Superadmin role required".to_string()))
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        AuthUser {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
            branch_id: user.branch_id,
        }
    }
}

/// Session cookie first, then `Authorization: Bearer`.
fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.settings.auth.cookie_name)
            .ok_or_else(|| ApiError::Unauthenticated("Not logged in".to_string()))?;

        let claims = state.jwt.verify(&token)?;

        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::Unauthenticated("User is no longer active".to_string()))?;

        Ok(AuthUser::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            username: "lucia".into(),
            password_hash: String::new(),
            name: "Lucia".into(),
            role,
            branch_id: None,
            commission_bps: 300,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let jwt = JwtManager::new("test-secret-long-enough", 3600);
        let token = jwt.issue(&user(Role::Admin)).unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "lucia");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let jwt = JwtManager::new("test-secret-long-enough", 3600);
        let other = JwtManager::new("another-secret-entirely", 3600);
        let token = other.issue(&user(Role::Vendedor)).unwrap();
        assert!(matches!(jwt.verify(&token), Err(ApiError::Unauthenticated(_))));

        // Past the default 60s leeway.
        let expired = JwtManager::new("test-secret-long-enough", -120);
        let token = expired.issue(&user(Role::Vendedor)).unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("vendedor123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("vendedor123", &hash));
        assert!(!verify_password("vendedor124", &hash));
        assert!(!verify_password("vendedor123", "not-a-phc-string"));
    }

    #[test]
    fn test_role_checks() {
        let vendor = AuthUser::from(user(Role::Vendedor));
        assert!(vendor.require_admin().is_err());

        let admin = AuthUser::from(user(Role::Admin));
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_superadmin().is_err());

        let superadmin = AuthUser::from(user(Role::Superadmin));
        assert!(superadmin.require_admin().is_ok());
        assert!(superadmin.require_superadmin().is_ok());
    }
}
