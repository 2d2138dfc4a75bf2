//! Vote API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{upstream, ProxyResult};
use crate::auth::AuthToken;
use crate::models::{ViewId, VoteRequest};
use crate::AppState;

/// POST /api/views/{id}/vote - Cast the caller's vote.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    auth: AuthToken,
    Json(request): Json<VoteRequest>,
) -> ProxyResult {
    let body = serde_json::to_value(request)?;
    let resp = upstream(&state, Some(auth.token))
        .post(&format!("/views/{}/vote", id), &body)
        .await?;
    Ok(resp.relay(None, "Failed to vote"))
}

/// DELETE /api/views/{id}/vote - Retract the caller's vote.
pub async fn retract_vote(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    auth: AuthToken,
) -> ProxyResult {
    let resp = upstream(&state, Some(auth.token))
        .delete(&format!("/views/{}/vote", id))
        .await?;
    Ok(resp.relay(None, "Failed to cancel vote"))
}
