//! Session endpoints: who am I, store token, log out.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::{check_token, AuthToken};
use crate::errors::AppError;
use crate::models::{CurrentUser, MeResponse, SetTokenRequest};
use crate::AppState;

/// GET /api/auth/me - The signed-in user, read from the token payload.
pub async fn me(auth: AuthToken) -> Result<Json<MeResponse>, AppError> {
    let id = auth
        .claims
        .user_id
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
    Ok(Json(MeResponse {
        user: CurrentUser { id },
    }))
}

/// POST /api/auth/set-token - Store the token from the login callback in the
/// httpOnly cookie.
pub async fn set_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SetTokenRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let token = request.token.trim().to_string();
    if token.is_empty() {
        return Err(AppError::Validation("Token is required".to_string()));
    }

    let now = Utc::now();
    let claims = check_token(&token, now)?;
    let max_age = claims
        .exp
        .map(|exp| exp - now.timestamp())
        .unwrap_or(state.config.cookie_max_age_secs)
        .max(0);

    let cookie = Cookie::build((state.config.auth_cookie.clone(), token))
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .build();

    tracing::info!("Session started for user {:?}", claims.user_id);
    Ok((jar.add(cookie), Json(json!({ "success": true }))))
}

/// POST /api/auth/logout - Drop the auth cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<Value>) {
    let removal = Cookie::build((state.config.auth_cookie.clone(), "")).path("/");
    (
        StatusCode::OK,
        jar.remove(removal),
        Json(json!({ "success": true })),
    )
}
