use std::sync::Arc;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    config::{config_model::Auth, stage::Stage},
    infrastructure::axum_http::error_responses::AppError,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Verified caller identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("missing credential")]
    Missing,
    #[error("invalid credential: {0}")]
    Invalid(String),
}

/// Issues and verifies the self-contained HS256 session token and shapes the cookie carrying it.
#[derive(Clone)]
pub struct AuthTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
    cookie_name: String,
    secure_cookies: bool,
}

impl AuthTokens {
    pub fn new(auth: &Auth, stage: Stage) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            ttl_seconds: auth.token_ttl_seconds,
            cookie_name: auth.cookie_name.clone(),
            secure_cookies: stage.secure_cookies(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: usize::try_from(now)?,
            exp: usize::try_from(now + self.ttl_seconds)?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("failed to sign token: {}", e))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| TokenError::Invalid("invalid user id in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: token_data.claims.email,
        })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(self.ttl_seconds))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }

    /// The cookie wins over an `Authorization: Bearer` header.
    fn extract_token(&self, parts: &Parts) -> Result<String, TokenError> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(&self.cookie_name) {
            if !cookie.value().is_empty() {
                return Ok(cookie.value().to_string());
            }
        }

        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Err(TokenError::Missing);
        };
        let value = header
            .to_str()
            .map_err(|_| TokenError::Invalid("invalid Authorization header".to_string()))?;

        value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| TokenError::Invalid("invalid Authorization header format".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow!("stored password hash is malformed: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 401 that also expires the auth cookie.
#[derive(Debug)]
pub struct AuthRejection {
    removal_cookie: Option<Cookie<'static>>,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self.removal_cookie {
            Some(cookie) => (CookieJar::new().add(cookie), AppError::Unauthorized).into_response(),
            None => AppError::Unauthorized.into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(tokens) = parts.extensions.get::<Arc<AuthTokens>>().cloned() else {
            error!("auth: token service missing from request extensions");
            return Err(AuthRejection {
                removal_cookie: None,
            });
        };

        let verified = tokens
            .extract_token(parts)
            .and_then(|token| tokens.verify(&token));

        verified.map_err(|err| {
            debug!(error = %err, "auth: rejecting request");
            AuthRejection {
                removal_cookie: Some(tokens.removal_cookie()),
            }
        })
    }
}
