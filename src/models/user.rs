//! Signed-in user as seen by the gateway.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
}

/// Body of `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeResponse {
    pub user: CurrentUser,
}

/// Body of `POST /api/auth/set-token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetTokenRequest {
    #[serde(default)]
    pub token: String,
}
