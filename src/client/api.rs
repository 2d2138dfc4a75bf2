//! Typed API seams used by the client state, and their HTTP implementation.

use async_trait::async_trait;
use serde_json::json;

use crate::errors::AppError;
use crate::models::{
    Category, Comment, CurrentUser, DataEnvelope, MeResponse, NewComment, NewView, OptionId,
    Page, View, ViewEdit, ViewId, ViewQuery,
};
use crate::upstream::ApiClient;

#[async_trait]
pub trait ViewsApi: Send + Sync {
    async fn fetch_views(&self, query: &ViewQuery, cursor: Option<&str>)
        -> Result<Page<View>, AppError>;
    async fn fetch_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn create_view(&self, view: &NewView) -> Result<Option<View>, AppError>;
    /// `None` when the API acknowledged the edit without returning the view.
    async fn update_view(&self, id: ViewId, edit: &ViewEdit) -> Result<Option<View>, AppError>;
    async fn delete_view(&self, id: ViewId) -> Result<(), AppError>;
}

#[async_trait]
pub trait VotesApi: Send + Sync {
    async fn cast_vote(&self, view_id: ViewId, option_id: OptionId) -> Result<(), AppError>;
    async fn retract_vote(&self, view_id: ViewId) -> Result<(), AppError>;
}

#[async_trait]
pub trait CommentsApi: Send + Sync {
    async fn fetch_comments(
        &self,
        view_id: ViewId,
        per_page: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Comment>, AppError>;
    async fn create_comment(
        &self,
        view_id: ViewId,
        comment: &NewComment,
    ) -> Result<Comment, AppError>;
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    /// `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<CurrentUser>, AppError>;
    async fn store_token(&self, token: &str) -> Result<(), AppError>;
    async fn clear_token(&self) -> Result<(), AppError>;
}

/// Read `{ data: View }` if the body carries one.
fn optional_view(body: Option<serde_json::Value>) -> Option<View> {
    body.and_then(|b| serde_json::from_value::<DataEnvelope<View>>(b).ok())
        .map(|envelope| envelope.data)
}

// These impls speak the gateway's `/api` dialect: construct the client with the
// gateway's `/api` base URL. The cookie store carries the session cookie.

#[async_trait]
impl ViewsApi for ApiClient {
    async fn fetch_views(
        &self,
        query: &ViewQuery,
        cursor: Option<&str>,
    ) -> Result<Page<View>, AppError> {
        self.get("/views", &query.to_params(cursor))
            .await?
            .json("Failed to fetch views")
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, AppError> {
        let envelope: DataEnvelope<Vec<Category>> = self
            .get("/categories", &[])
            .await?
            .json("Failed to fetch categories")?;
        Ok(envelope.data)
    }

    async fn create_view(&self, view: &NewView) -> Result<Option<View>, AppError> {
        let body = serde_json::to_value(view)?;
        let resp = self
            .post("/views", &body)
            .await?
            .error_for_status("Failed to create view")?;
        Ok(optional_view(resp.body))
    }

    async fn update_view(&self, id: ViewId, edit: &ViewEdit) -> Result<Option<View>, AppError> {
        let body = serde_json::to_value(edit)?;
        let resp = self
            .patch(&format!("/views/{}", id), &body)
            .await?
            .error_for_status("Failed to update view")?;
        Ok(optional_view(resp.body))
    }

    async fn delete_view(&self, id: ViewId) -> Result<(), AppError> {
        self.delete(&format!("/views/{}", id))
            .await?
            .error_for_status("Failed to delete view")?;
        Ok(())
    }
}

#[async_trait]
impl VotesApi for ApiClient {
    async fn cast_vote(&self, view_id: ViewId, option_id: OptionId) -> Result<(), AppError> {
        self.post(
            &format!("/views/{}/vote", view_id),
            &json!({ "option_id": option_id }),
        )
        .await?
        .error_for_status("Failed to vote")?;
        Ok(())
    }

    async fn retract_vote(&self, view_id: ViewId) -> Result<(), AppError> {
        self.delete(&format!("/views/{}/vote", view_id))
            .await?
            .error_for_status("Failed to cancel vote")?;
        Ok(())
    }
}

#[async_trait]
impl CommentsApi for ApiClient {
    async fn fetch_comments(
        &self,
        view_id: ViewId,
        per_page: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Comment>, AppError> {
        let mut query = vec![("per_page", per_page.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        self.get(&format!("/views/{}/comments", view_id), &query)
            .await?
            .json("Failed to load comments")
    }

    async fn create_comment(
        &self,
        view_id: ViewId,
        comment: &NewComment,
    ) -> Result<Comment, AppError> {
        let body = serde_json::to_value(comment)?;
        let envelope: DataEnvelope<Comment> = self
            .post(&format!("/views/{}/comments", view_id), &body)
            .await?
            .json("Failed to post comment")?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn current_user(&self) -> Result<Option<CurrentUser>, AppError> {
        let resp = self.get("/auth/me", &[]).await?;
        if resp.status.as_u16() == 401 {
            return Ok(None);
        }
        let me: MeResponse = resp.json("Failed to load session")?;
        Ok(Some(me.user))
    }

    async fn store_token(&self, token: &str) -> Result<(), AppError> {
        self.post("/auth/set-token", &json!({ "token": token }))
            .await?
            .error_for_status("Login failed")?;
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), AppError> {
        self.post("/auth/logout", &json!({}))
            .await?
            .error_for_status("Logout failed")?;
        Ok(())
    }
}
