//! JWT authentication module.
//!
//! Handles session token issuance and validation, the [`CurrentUser`]
//! extractor, role checks and password hashing.
//!
//! ## Request Authentication
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization: Bearer <jwt>   ──┐                                     │
//! │  Cookie: token=<jwt>           ──┴──► validate (HS256, exp)            │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                  Role::parse(claims.role)               │
//! │                                        │                                │
//! │                     unknown ──► 403    └──► CurrentUser { id, role }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use resto_core::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie set at login.
pub const TOKEN_COOKIE: &str = "token";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    /// Role as issued; canonicalized when a request is authenticated
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager { secret, lifetime_secs }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a session token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::unauthorized("Token expired"),
            _ => ApiError::unauthorized("Invalid token"),
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract the session token from a `Cookie` header.
pub fn extract_cookie_token(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Current User
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {} is not allowed to perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::parse(&claims.role).ok_or_else(|| {
            warn!(user_id = %claims.sub, role = %claims.role, "Token carries an unknown role");
            ApiError::forbidden("Unknown role")
        })?;

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
            role,
        })
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token);

        let cookie = || {
            parts
                .headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|h| h.to_str().ok())
                .find_map(extract_cookie_token)
        };

        let token = bearer
            .or_else(cookie)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?
            .to_string();

        let claims = state.jwt.validate(&token)?;
        let user = CurrentUser::try_from(claims)?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn user(role: Role) -> User {
        User {
            id: "u-1".into(),
            name: "Siti".into(),
            email: "siti@resto.test".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.issue(&user(Role::Kasir)).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, "kasir");
        assert!(claims.exp > claims.iat);

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.role, Role::Kasir);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("a".into(), 3600).issue(&user(Role::Admin)).unwrap();
        let err = JwtManager::new("b".into(), 3600).validate(&token).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_role_is_canonicalized_and_unknown_forbidden() {
        let mut claims = Claims {
            sub: "u".into(),
            email: "e@x.io".into(),
            role: " KOKI ".into(),
            iat: 0,
            exp: 0,
            jti: "j".into(),
        };
        assert_eq!(CurrentUser::try_from(claims.clone()).unwrap().role, Role::Koki);

        claims.role = "waiter".into();
        let err = CurrentUser::try_from(claims).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require() {
        let koki = CurrentUser {
            id: "k".into(),
            email: "k@x.io".into(),
            role: Role::Koki,
        };
        assert!(koki.require(&[Role::Koki, Role::Admin]).is_ok());
        assert_eq!(koki.require(&[Role::Kasir]).unwrap_err().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_cookie_token("theme=dark; token=xyz"), Some("xyz"));
        assert_eq!(extract_cookie_token("theme=dark"), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("salah", &hash));
        assert!(!verify_password("rahasia123", "not-a-hash"));
    }
}
