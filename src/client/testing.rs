//! Scripted in-memory API for client state tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{lock, CommentsApi, SessionApi, ViewsApi, VotesApi};
use crate::errors::AppError;
use crate::models::{
    Category, Comment, CommentAuthor, CurrentUser, NewComment, NewView, OptionId, Page, PageMeta,
    View, ViewEdit, ViewId, ViewQuery,
};

#[derive(Default)]
struct Script {
    view_pages: VecDeque<Result<Page<View>, AppError>>,
    view_fetches: Vec<(ViewQuery, Option<String>)>,
    comment_pages: VecDeque<Result<Page<Comment>, AppError>>,
    comment_fetches: Vec<(ViewId, Option<String>)>,
    posted_comments: Vec<(ViewId, String)>,
    created_views: Vec<NewView>,
    updated_views: Vec<(ViewId, ViewEdit)>,
    deleted_views: Vec<ViewId>,
    update_response: Option<View>,
    cast_votes: Vec<(ViewId, OptionId)>,
    retracted_votes: Vec<ViewId>,
    vote_failure: Option<AppError>,
    retract_failure: Option<AppError>,
    user: Option<CurrentUser>,
    token: Option<String>,
}

#[derive(Default)]
pub struct MockApi {
    script: Mutex<Script>,
    vote_gate: Mutex<Option<Arc<Notify>>>,
    page_gate: Mutex<Option<Arc<Notify>>>,
    comment_gate: Mutex<Option<Arc<Notify>>>,
}

pub fn view_page(views: Vec<View>, next_cursor: Option<&str>) -> Page<View> {
    Page {
        data: views,
        meta: PageMeta {
            per_page: 20,
            has_next: next_cursor.is_some(),
            next_cursor: next_cursor.map(str::to_string),
        },
    }
}

pub fn sample_comment(id: i64, content: &str) -> Comment {
    Comment {
        id,
        content: content.to_string(),
        author: CommentAuthor {
            id: 3,
            nickname: "jun".to_string(),
        },
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
}

impl MockApi {
    /// Every vote/unvote request waits for one `notify_one` on the returned handle.
    pub fn hold_votes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.vote_gate) = Some(gate.clone());
        gate
    }

    /// Every view page request waits for one `notify_one` on the returned handle.
    pub fn hold_pages(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.page_gate) = Some(gate.clone());
        gate
    }

    /// Every comment post waits for one `notify_one` on the returned handle.
    pub fn hold_comments(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.comment_gate) = Some(gate.clone());
        gate
    }

    pub fn push_views(&self, page: Result<Page<View>, AppError>) {
        lock(&self.script).view_pages.push_back(page);
    }

    pub fn push_comments(&self, page: Result<Page<Comment>, AppError>) {
        lock(&self.script).comment_pages.push_back(page);
    }

    pub fn fail_votes(&self, err: AppError) {
        lock(&self.script).vote_failure = Some(err);
    }

    pub fn fail_retracts(&self, err: AppError) {
        lock(&self.script).retract_failure = Some(err);
    }

    pub fn clear_failures(&self) {
        let mut script = lock(&self.script);
        script.vote_failure = None;
        script.retract_failure = None;
    }

    pub fn set_user(&self, user: Option<CurrentUser>) {
        lock(&self.script).user = user;
    }

    pub fn respond_to_update(&self, view: View) {
        lock(&self.script).update_response = Some(view);
    }

    pub fn view_fetches(&self) -> Vec<(ViewQuery, Option<String>)> {
        lock(&self.script).view_fetches.clone()
    }

    pub fn comment_fetches(&self) -> Vec<(ViewId, Option<String>)> {
        lock(&self.script).comment_fetches.clone()
    }

    pub fn posted_comments(&self) -> Vec<(ViewId, String)> {
        lock(&self.script).posted_comments.clone()
    }

    pub fn created_views(&self) -> Vec<NewView> {
        lock(&self.script).created_views.clone()
    }

    pub fn updated_views(&self) -> Vec<(ViewId, ViewEdit)> {
        lock(&self.script).updated_views.clone()
    }

    pub fn deleted_views(&self) -> Vec<ViewId> {
        lock(&self.script).deleted_views.clone()
    }

    pub fn cast_votes(&self) -> Vec<(ViewId, OptionId)> {
        lock(&self.script).cast_votes.clone()
    }

    pub fn retracted_votes(&self) -> Vec<ViewId> {
        lock(&self.script).retracted_votes.clone()
    }

    pub fn stored_token(&self) -> Option<String> {
        lock(&self.script).token.clone()
    }

    async fn pass_gate(gate: &Mutex<Option<Arc<Notify>>>) {
        let gate = lock(gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ViewsApi for MockApi {
    async fn fetch_views(
        &self,
        query: &ViewQuery,
        cursor: Option<&str>,
    ) -> Result<Page<View>, AppError> {
        let next = {
            let mut script = lock(&self.script);
            script
                .view_fetches
                .push((query.clone(), cursor.map(str::to_string)));
            script.view_pages.pop_front()
        };
        Self::pass_gate(&self.page_gate).await;
        next.unwrap_or_else(|| Ok(view_page(Vec::new(), None)))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(vec![Category {
            id: 1,
            name: "Food".to_string(),
        }])
    }

    async fn create_view(&self, view: &NewView) -> Result<Option<View>, AppError> {
        lock(&self.script).created_views.push(view.clone());
        Ok(None)
    }

    async fn update_view(&self, id: ViewId, edit: &ViewEdit) -> Result<Option<View>, AppError> {
        let mut script = lock(&self.script);
        script.updated_views.push((id, edit.clone()));
        Ok(script.update_response.take())
    }

    async fn delete_view(&self, id: ViewId) -> Result<(), AppError> {
        lock(&self.script).deleted_views.push(id);
        Ok(())
    }
}

#[async_trait]
impl VotesApi for MockApi {
    async fn cast_vote(&self, view_id: ViewId, option_id: OptionId) -> Result<(), AppError> {
        let failure = {
            let mut script = lock(&self.script);
            script.cast_votes.push((view_id, option_id));
            script.vote_failure.clone()
        };
        Self::pass_gate(&self.vote_gate).await;
        failure.map_or(Ok(()), Err)
    }

    async fn retract_vote(&self, view_id: ViewId) -> Result<(), AppError> {
        let failure = {
            let mut script = lock(&self.script);
            script.retracted_votes.push(view_id);
            script.retract_failure.clone()
        };
        Self::pass_gate(&self.vote_gate).await;
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl CommentsApi for MockApi {
    async fn fetch_comments(
        &self,
        view_id: ViewId,
        _per_page: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Comment>, AppError> {
        let mut script = lock(&self.script);
        script
            .comment_fetches
            .push((view_id, cursor.map(str::to_string)));
        script.comment_pages.pop_front().unwrap_or_else(|| {
            Ok(Page {
                data: Vec::new(),
                meta: PageMeta {
                    per_page: 20,
                    has_next: false,
                    next_cursor: None,
                },
            })
        })
    }

    async fn create_comment(
        &self,
        view_id: ViewId,
        comment: &NewComment,
    ) -> Result<Comment, AppError> {
        let id = {
            let mut script = lock(&self.script);
            script
                .posted_comments
                .push((view_id, comment.content.clone()));
            1000 + script.posted_comments.len() as i64
        };
        Self::pass_gate(&self.comment_gate).await;
        Ok(sample_comment(id, &comment.content))
    }
}

#[async_trait]
impl SessionApi for MockApi {
    async fn current_user(&self) -> Result<Option<CurrentUser>, AppError> {
        Ok(lock(&self.script).user)
    }

    async fn store_token(&self, token: &str) -> Result<(), AppError> {
        lock(&self.script).token = Some(token.to_string());
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), AppError> {
        lock(&self.script).token = None;
        Ok(())
    }
}
