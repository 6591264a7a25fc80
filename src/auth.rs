//! JWT session tokens.
//!
//! A token carries the user id plus the profile fields the evaluator reads
//! (role and explicit permission list), so a request's [`User`] can be
//! rebuilt without a profile lookup. Password handling belongs to the
//! identity service, not here.

use hyper::http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Auth as AuthConfig;
use crate::error::{Error, Result};
use crate::user::{Profile, User};

const MIN_SECRET_LENGTH: usize = 32;

fn validate_secret(config: &AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_SECRET_LENGTH {
        return Err(Error::Config(format!(
            "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    /// Rebuild the user view carried by these claims.
    pub fn into_user(self) -> User {
        let profile = (self.role.is_some() || self.permissions.is_some()).then(|| Profile {
            role: self.role,
            permissions: self.permissions,
        });
        User {
            id: self.sub,
            profile,
        }
    }
}

/// Create a session token for `user`.
pub fn create_token(config: &AuthConfig, user: &User) -> Result<String> {
    validate_secret(config)?;
    let now = jiff::Timestamp::now();
    let hours = i64::from(config.token_expiry_days) * 24;
    let exp = jiff::Span::new()
        .try_hours(hours)
        .and_then(|lifetime| now.checked_add(lifetime))
        .map_err(|e| {
            Error::Config(format!(
                "token_expiry_days = {} is out of range: {e}",
                config.token_expiry_days
            ))
        })?;

    let profile = user.profile.clone().unwrap_or_default();
    let claims = Claims {
        sub: user.id.clone(),
        exp: exp.as_second(),
        iat: now.as_second(),
        role: profile.role,
        permissions: profile.permissions,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token creation failed: {e}")))
}

/// Verify and decode a session token.
///
/// # Returns
/// - `Ok(Claims)` if the token is valid
/// - `Err(Error::TokenExpired)` if the token has expired
/// - `Err(Error::Unauthorized)` for any other validation failure
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    validate_secret(config)?;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::Unauthorized,
    })?;

    Ok(token_data.claims)
}

/// Extract the user from the `Authorization: Bearer <token>` header.
///
/// The scheme name is matched case-insensitively (RFC 7235).
pub fn extract_user(headers: &HeaderMap, config: &AuthConfig) -> Result<User> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::Unauthorized)?;

    let token = auth_header
        .get(..7)
        .filter(|p| p.eq_ignore_ascii_case("bearer "))
        .and_then(|_| auth_header.get(7..))
        .ok_or(Error::Unauthorized)?;

    Ok(verify_token(config, token)?.into_user())
}
