/**
 * Session Tokens
 *
 * Bearer JWTs identify the caller. Tokens are minted by the identity service;
 * `create_token` exists for tooling and tests.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::user::User;

/// Tokens expire after 30 days
const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn user_id(&self) -> BackendResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| BackendError::unauthorized("Invalid user ID in token"))
    }
}

/// Create a JWT token for a user
pub fn create_token(secret: &str, user: &User) -> BackendResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp: (now + TOKEN_TTL_SECS) as u64,
        iat: now as u64,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> BackendResult<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(data.claims)
}
