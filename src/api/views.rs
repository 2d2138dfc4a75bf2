//! View API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{forward_params, upstream, ProxyResult};
use crate::auth::{AuthToken, MaybeAuthToken};
use crate::models::{NewView, ViewEdit, ViewId};
use crate::AppState;

/// Query parameters accepted by `GET /api/views`, forwarded verbatim.
#[derive(Debug, Default, Deserialize)]
pub struct ListViewsParams {
    pub sort: Option<String>,
    pub per_page: Option<String>,
    pub cursor: Option<String>,
    pub author: Option<String>,
    pub vote_filter: Option<String>,
    pub category: Option<String>,
}

/// GET /api/views - List views, page by page.
pub async fn list_views(
    State(state): State<AppState>,
    MaybeAuthToken(token): MaybeAuthToken,
    Query(params): Query<ListViewsParams>,
) -> ProxyResult {
    let query = forward_params(&[
        ("sort", params.sort.as_ref()),
        ("per_page", params.per_page.as_ref()),
        ("cursor", params.cursor.as_ref()),
        ("author", params.author.as_ref()),
        ("vote_filter", params.vote_filter.as_ref()),
        ("category", params.category.as_ref()),
    ]);

    let resp = upstream(&state, token).get("/views", &query).await?;
    Ok(resp.relay(None, "Failed to fetch views"))
}

/// POST /api/views - Create a new view.
pub async fn create_view(
    State(state): State<AppState>,
    auth: AuthToken,
    Json(request): Json<NewView>,
) -> ProxyResult {
    let view = request.validate()?;

    let resp = upstream(&state, Some(auth.token))
        .post("/views", &view.to_upstream_body())
        .await?;
    if resp.is_success() {
        tracing::info!("View created by user {:?}", auth.claims.user_id);
    }
    Ok(resp.relay(Some(StatusCode::CREATED), "Failed to create view"))
}

/// PATCH /api/views/{id} - Edit title and options of an owned view.
pub async fn update_view(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    auth: AuthToken,
    Json(request): Json<ViewEdit>,
) -> ProxyResult {
    let edit = request.validate()?;

    let resp = upstream(&state, Some(auth.token))
        .patch(&format!("/views/{}", id), &edit.to_upstream_body())
        .await?;
    Ok(resp.relay(None, "Failed to update view"))
}

/// DELETE /api/views/{id} - Delete an owned view.
pub async fn delete_view(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    auth: AuthToken,
) -> ProxyResult {
    let resp = upstream(&state, Some(auth.token))
        .delete(&format!("/views/{}", id))
        .await?;
    if resp.is_success() {
        tracing::info!("View {} deleted", id);
    }
    Ok(resp.relay(Some(StatusCode::NO_CONTENT), "Failed to delete view"))
}
