//! Same-origin proxy routes.
//!
//! Each handler reads the auth cookie through the `auth` extractors, validates what it
//! can locally, and re-issues the call upstream with a bearer credential.

mod categories;
mod comments;
mod session;
mod views;
mod votes;

pub use categories::*;
pub use comments::*;
pub use session::*;
pub use views::*;
pub use votes::*;

use axum::response::Response;

use crate::errors::AppError;
use crate::upstream::ApiClient;
use crate::AppState;

/// Response type for proxy handlers.
pub type ProxyResult = Result<Response, AppError>;

/// Upstream client carrying the caller's token, if any.
fn upstream(state: &AppState, token: Option<String>) -> ApiClient {
    state.upstream.with_token(token)
}

/// Copy the named query parameters that are present and non-empty.
fn forward_params<'a>(pairs: &[(&'a str, Option<&String>)]) -> Vec<(&'a str, String)> {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| (*key, v.clone()))
        })
        .collect()
}
