use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// Name of the cookie that carries the signed credential.
pub const TOKEN_COOKIE: &str = "token";

/// Validity window of an issued credential, in seconds (6 hours).
pub const TOKEN_TTL_SECS: i64 = 6 * 60 * 60;

/// Claims
///
/// Payload signed into the credential. `email` is the identity; `iat`/`exp` bound
/// its lifetime and `exp` is always validated on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("failed to sign credential: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("invalid credential")]
    InvalidCredential,
}

/// TokenService
///
/// Issues and verifies HS256 credentials. Built once at startup from the
/// configured secret and shared through `AppState`.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Fails with `MissingSecret` for an empty secret.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let mut validation = Validation::default();
        validation.validate_exp = true;

        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
            }),
        })
    }

    /// Signs a credential for `email`, valid for `TOKEN_TTL_SECS`.
    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.keys.encoding).map_err(AuthError::Signing)
    }

    /// Checks signature, structure and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        match decode::<Claims>(token, &self.keys.decoding, &self.keys.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("credential expired"),
                    kind => tracing::debug!(?kind, "credential rejected"),
                }
                Err(AuthError::InvalidCredential)
            }
        }
    }
}

/// AuthUser
///
/// The identity resolved from a verified credential. Handlers on the protected
/// router take it as an argument; it is the input to per-endpoint ownership checks.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub email: String,
}

/// Resolution order:
/// 1. An identity already attached by the auth middleware (request extensions).
/// 2. The `token` cookie, verified with the shared `TokenService`.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
            Some(cookie) => cookie.value().to_string(),
            None => {
                tracing::warn!("token cookie missing, authentication denied");
                return Err(ApiError::Unauthenticated);
            }
        };

        let tokens = TokenService::from_ref(state);
        let claims = tokens.verify(&token).map_err(|_| {
            tracing::warn!("token verification failed, authentication denied");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser {
            email: claims.email,
        })
    }
}
