//! Cookie-to-bearer token handling.
//!
//! The auth token lives in an httpOnly cookie and never reaches page logic. Extractors
//! here pull it from the cookie so handlers can forward it upstream as a bearer
//! credential. The payload decoding below is unverified and advisory only: it lets the
//! gateway reject an obviously expired token early, the upstream API stays the
//! authority on validity.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::AppState;

/// Claims the gateway reads from the token payload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Expiry, seconds since the epoch
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp.saturating_mul(1000) < now.timestamp_millis(),
            None => false,
        }
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AppError> {
    let invalid = || AppError::Unauthorized("Invalid token".to_string());

    let payload = token.split('.').nth(1).ok_or_else(invalid)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| invalid())?;
    serde_json::from_slice(&bytes).map_err(|_| invalid())
}

/// Decode the token and reject it if it has already expired.
pub fn check_token(token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AppError> {
    let claims = decode_claims(token)?;
    if claims.is_expired(now) {
        return Err(AppError::Unauthorized("Token expired".to_string()));
    }
    Ok(claims)
}

fn cookie_token(parts: &Parts, state: &AppState) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(&state.config.auth_cookie)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// A usable token taken from the auth cookie. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub claims: TokenClaims,
}

impl FromRequestParts<AppState> for AuthToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_token(parts, state).ok_or_else(AppError::login_required)?;
        let claims = check_token(&token, Utc::now())?;
        Ok(AuthToken { token, claims })
    }
}

/// The auth cookie's token when present and usable; anonymous otherwise.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthToken(pub Option<String>);

impl FromRequestParts<AppState> for MaybeAuthToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_token(parts, state) else {
            return Ok(MaybeAuthToken(None));
        };

        match check_token(&token, Utc::now()) {
            Ok(_) => Ok(MaybeAuthToken(Some(token))),
            Err(e) => {
                tracing::debug!("Forwarding anonymously, cookie token unusable: {}", e);
                Ok(MaybeAuthToken(None))
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn make_token(user_id: i64, exp: Option<i64>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = match exp {
        Some(exp) => serde_json::json!({ "user_id": user_id, "exp": exp }),
        None => serde_json::json!({ "user_id": user_id }),
    };
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, payload)
}
