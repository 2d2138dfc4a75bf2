//! Category API endpoint.

use axum::extract::State;

use super::{upstream, ProxyResult};
use crate::AppState;

/// GET /api/categories - List categories. Never authenticated.
pub async fn list_categories(State(state): State<AppState>) -> ProxyResult {
    let resp = upstream(&state, None).get("/categories", &[]).await?;
    Ok(resp.relay(None, "Failed to fetch categories"))
}
