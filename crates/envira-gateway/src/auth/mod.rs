//! Bearer-token identity for the dashboard and chat routes.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::UserRepository;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingHeader,
    #[error("Invalid header format")]
    InvalidHeaderFormat,
    /// Valid signature, but the subject is not a known user.
    #[error("Unknown user")]
    UnknownUser,
    #[error("User lookup failed: {0}")]
    UserLookup(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::UserLookup(ref reason) => {
                tracing::error!("user lookup failed: {}", reason);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };
        (
            status,
            Json(json!({ "success": false, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub expiry_seconds: u64,
}

impl JwtConfig {
    /// Create a new JWT config with a secret
    pub fn new(secret: &str, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            expiry_seconds: 24 * 3600, // 1 day default
        }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.expiry_seconds as usize,
            iat: now,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Verify a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    AuthError::TokenExpired
                } else {
                    AuthError::InvalidToken
                }
            })
    }
}

/// Authenticated user extractor. The token subject must name a stored user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub claims: Claims,
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    JwtConfig: FromRef<S>,
    Arc<dyn UserRepository>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AuthError::MissingHeader
                    } else {
                        AuthError::InvalidHeaderFormat
                    }
                })?;

        let claims = JwtConfig::from_ref(state).verify_token(bearer.token())?;
        let users = <Arc<dyn UserRepository> as FromRef<S>>::from_ref(state);
        users
            .get(&claims.sub)
            .await
            .map_err(|e| AuthError::UserLookup(e.to_string()))?
            .ok_or(AuthError::UnknownUser)?;

        Ok(Self {
            user_id: claims.sub.clone(),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new(
            "test_secret_key_that_is_long_enough",
            "envira-test".to_string(),
            "envira".to_string(),
        )
    }

    #[test]
    fn jwt_config_generates_and_verifies_token() {
        let config = config();

        let token = config.generate_token("user_alice").unwrap();
        let claims = config.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "user_alice");
        assert_eq!(claims.iss, "envira-test");
        assert_eq!(claims.aud, "envira");
    }

    #[test]
    fn invalid_token_is_rejected() {
        let result = config().verify_token("invalid_token");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = JwtConfig::new("another_secret", "envira-test".into(), "envira".into());
        let token = other.generate_token("user_alice").unwrap();
        assert!(config().verify_token(&token).is_err());
    }
}
