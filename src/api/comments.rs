//! Comment API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{forward_params, upstream, ProxyResult};
use crate::auth::{AuthToken, MaybeAuthToken};
use crate::models::{NewComment, ViewId};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListCommentsParams {
    pub per_page: Option<String>,
    pub cursor: Option<String>,
}

/// GET /api/views/{id}/comments - List comments, page by page.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    MaybeAuthToken(token): MaybeAuthToken,
    Query(params): Query<ListCommentsParams>,
) -> ProxyResult {
    let query = forward_params(&[
        ("per_page", params.per_page.as_ref()),
        ("cursor", params.cursor.as_ref()),
    ]);

    let resp = upstream(&state, token)
        .get(&format!("/views/{}/comments", id), &query)
        .await?;
    Ok(resp.relay(None, "Failed to load comments"))
}

/// POST /api/views/{id}/comments - Post a comment.
pub async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    auth: AuthToken,
    Json(request): Json<NewComment>,
) -> ProxyResult {
    let comment = request.validate()?;

    let resp = upstream(&state, Some(auth.token))
        .post(
            &format!("/views/{}/comments", id),
            &comment.to_upstream_body(),
        )
        .await?;
    Ok(resp.relay(Some(StatusCode::CREATED), "Failed to post comment"))
}
