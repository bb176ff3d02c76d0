use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::RequestError;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const JWT_EXPIRY_DURATION: time::Duration = time::Duration::hours(24);
pub const JWT_ISSUER: &str = "blog-api";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    email: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
}

/// Caller identity resolved from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Issues and validates HS256 identity tokens with a secret fixed at startup.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time bounds are checked against our own clock in `validate_at`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::new();
        validation.set_issuer(&[JWT_ISSUER]);
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, id: i64, email: &str) -> Result<String> {
        self.issue_at(id, email, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, id: i64, email: &str, now: OffsetDateTime) -> Result<String> {
        let issued_at = now.unix_timestamp();
        let claim = AuthClaim {
            id,
            email: email.to_owned(),
            iat: issued_at,
            nbf: issued_at,
            exp: (now + JWT_EXPIRY_DURATION).unix_timestamp(),
            iss: JWT_ISSUER.to_owned(),
        };
        jsonwebtoken::encode(&Header::default(), &claim, &self.encoding_key)
            .context("Failed to generate jwt token")
    }

    pub fn validate(&self, token: &str) -> Result<AuthUser, TokenError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Accepts the token only while `nbf <= now <= exp`, with no leeway.
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<AuthUser, TokenError> {
        let claim = jsonwebtoken::decode::<AuthClaim>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Malformed)?
            .claims;
        let now = now.unix_timestamp();
        if now < claim.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now > claim.exp {
            return Err(TokenError::Expired);
        }
        Ok(AuthUser {
            id: claim.id,
            email: claim.email,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let tokens = match parts.extensions.get::<Arc<TokenService>>() {
            Some(tokens) => tokens.clone(),
            None => {
                tracing::error!("token service missing from request extensions");
                return Err(RequestError::ServerError);
            }
        };

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(header) => header,
            None => return Err(RequestError::Unauthenticated("Authorization header required")),
        };
        let header = match header.to_str() {
            Ok(header) => header.trim(),
            Err(_) => {
                tracing::debug!("authorization header is not valid ascii");
                return Err(RequestError::Unauthenticated("Invalid token"));
            }
        };
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(RequestError::Unauthenticated("Authorization header required"));
        }

        let user = tokens.validate(token).map_err(|reason| {
            tracing::debug!(%reason, "rejected token");
            RequestError::Unauthenticated("Invalid token")
        })?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

pub async fn verify_password_argon2(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to parse password hash"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
