//! View gateway
//!
//! Same-origin gateway for the View voting app plus the client-side state that drives it:
//! optimistic voting with rollback and cursor-paginated feeds.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use config::Config;
use errors::AppError;
use upstream::ApiClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: ApiClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let upstream = ApiClient::stateless(
            &config.upstream_url,
            Duration::from_secs(config.upstream_timeout_secs),
        )?;
        Ok(Self {
            upstream,
            config: Arc::new(config),
        })
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // API routes
    let api_routes = Router::new()
        // Views
        .route("/views", get(api::list_views).post(api::create_view))
        .route(
            "/views/{id}",
            patch(api::update_view).delete(api::delete_view),
        )
        // Votes
        .route(
            "/views/{id}/vote",
            post(api::cast_vote).delete(api::retract_vote),
        )
        // Comments
        .route(
            "/views/{id}/comments",
            get(api::list_comments).post(api::create_comment),
        )
        // Categories
        .route("/categories", get(api::list_categories))
        // Session
        .route("/auth/me", get(api::me))
        .route("/auth/set-token", post(api::set_token))
        .route("/auth/logout", post(api::logout));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
