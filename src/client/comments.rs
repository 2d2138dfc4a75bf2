//! Comments under one view.

use std::sync::{Arc, Mutex};

use super::{lock, Completion, CommentsApi, CursorWindow, LoadState, Session};
use crate::errors::AppError;
use crate::models::{Comment, NewComment, ViewId, DEFAULT_PER_PAGE};

struct ThreadState {
    window: CursorWindow<Comment>,
    comments_count: i64,
    submitting: bool,
}

pub struct CommentThread<A: ?Sized> {
    api: Arc<A>,
    session: Session,
    view_id: ViewId,
    per_page: u32,
    state: Mutex<ThreadState>,
}

impl<A: CommentsApi + ?Sized> CommentThread<A> {
    /// `comments_count` seeds the counter shown next to the thread.
    pub fn new(api: Arc<A>, session: Session, view_id: ViewId, comments_count: i64) -> Self {
        Self {
            api,
            session,
            view_id,
            per_page: DEFAULT_PER_PAGE,
            state: Mutex::new(ThreadState {
                window: CursorWindow::new(),
                comments_count,
                submitting: false,
            }),
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn comments(&self) -> Vec<Comment> {
        lock(&self.state).window.items().to_vec()
    }

    pub fn comments_count(&self) -> i64 {
        lock(&self.state).comments_count
    }

    pub fn has_next(&self) -> bool {
        lock(&self.state).window.has_next()
    }

    pub fn state(&self) -> LoadState {
        lock(&self.state).window.state()
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).submitting
    }

    pub async fn refresh(&self) -> Result<usize, AppError> {
        let ticket = lock(&self.state).window.begin_refresh();
        let result = self
            .api
            .fetch_comments(self.view_id, self.per_page, ticket.cursor())
            .await;
        let completion = lock(&self.state).window.complete(ticket, result);
        self.settle(completion)
    }

    pub async fn load_more(&self) -> Result<usize, AppError> {
        let Some(ticket) = lock(&self.state).window.begin_load_more() else {
            return Ok(0);
        };
        let result = self
            .api
            .fetch_comments(self.view_id, self.per_page, ticket.cursor())
            .await;
        let completion = lock(&self.state).window.complete(ticket, result);
        self.settle(completion)
    }

    fn settle(&self, completion: Result<Completion, AppError>) -> Result<usize, AppError> {
        match completion {
            Ok(Completion::Applied(added)) => Ok(added),
            Ok(Completion::Stale) => Ok(0),
            Err(e) => {
                tracing::warn!("Failed to load comments for view {}: {}", self.view_id, e);
                self.session.report(&e);
                Err(e)
            }
        }
    }

    /// Post a comment. `Ok(None)` when another submission is still running.
    pub async fn post(&self, content: &str) -> Result<Option<Comment>, AppError> {
        if !self.session.is_authenticated() {
            self.session.require_login("Login required to comment");
            return Err(AppError::login_required());
        }
        let comment = NewComment::new(content).validate()?;

        {
            let mut state = lock(&self.state);
            if state.submitting {
                return Ok(None);
            }
            state.submitting = true;
        }

        let result = self.api.create_comment(self.view_id, &comment).await;

        let mut state = lock(&self.state);
        state.submitting = false;
        match result {
            Ok(created) => {
                state.window.prepend(created.clone());
                state.comments_count += 1;
                Ok(Some(created))
            }
            Err(e) => {
                drop(state);
                self.session.report(&e);
                Err(e)
            }
        }
    }
}
