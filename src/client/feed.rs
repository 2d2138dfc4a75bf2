//! The views list: one cursor window bound to a query.
//!
//! Changing sort, vote filter or category resets the window on the spot. Nothing is
//! fetched until the owner calls `refresh`, and a page still in flight for the old
//! parameters is discarded when it lands.

use std::sync::{Arc, Mutex};

use super::{
    lock, Completion, CursorWindow, LoadState, PollHandle, PollState, Session, VoteEvent,
    ViewsApi,
};
use crate::errors::AppError;
use crate::models::{NewView, OptionId, SortType, View, ViewEdit, ViewId, ViewQuery, VoteFilter};

struct FeedState {
    query: ViewQuery,
    window: CursorWindow<View>,
}

pub struct ViewFeed<A: ?Sized> {
    api: Arc<A>,
    session: Session,
    state: Mutex<FeedState>,
}

impl<A: ViewsApi + ?Sized> ViewFeed<A> {
    pub fn new(api: Arc<A>, session: Session, query: ViewQuery) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(FeedState {
                query,
                window: CursorWindow::new(),
            }),
        }
    }

    pub fn query(&self) -> ViewQuery {
        lock(&self.state).query.clone()
    }

    /// Snapshot of the materialized views, in server order.
    pub fn views(&self) -> Vec<View> {
        lock(&self.state).window.items().to_vec()
    }

    pub fn get(&self, id: ViewId) -> Option<View> {
        lock(&self.state).window.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).window.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).window.is_empty()
    }

    pub fn has_next(&self) -> bool {
        lock(&self.state).window.has_next()
    }

    pub fn state(&self) -> LoadState {
        lock(&self.state).window.state()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).window.error().map(str::to_string)
    }

    pub fn set_sort(&self, sort: SortType) -> bool {
        self.update_query(|q| {
            if q.sort == sort {
                return false;
            }
            q.sort = sort;
            true
        })
    }

    pub fn set_vote_filter(&self, filter: VoteFilter) -> bool {
        self.update_query(|q| {
            if q.vote_filter == filter {
                return false;
            }
            q.vote_filter = filter;
            true
        })
    }

    pub fn set_category(&self, category: Option<i64>) -> bool {
        self.update_query(|q| {
            if q.category == category {
                return false;
            }
            q.category = category;
            true
        })
    }

    /// Apply a query change; a real change empties the window and waits for `refresh`.
    fn update_query<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut ViewQuery) -> bool,
    {
        let mut state = lock(&self.state);
        if !change(&mut state.query) {
            return false;
        }
        state.window.reset();
        tracing::debug!("View query changed to {:?}", state.query);
        true
    }

    /// Load the first page for the current query. Returns how many views landed; a
    /// response overtaken by a query change counts as zero.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        let (query, ticket) = {
            let mut state = lock(&self.state);
            let ticket = state.window.begin_refresh();
            (state.query.clone(), ticket)
        };

        let result = self.api.fetch_views(&query, ticket.cursor()).await;
        let completion = lock(&self.state).window.complete(ticket, result);
        self.settle(completion)
    }

    /// Append the next page. A no-op (returning zero) when a load is running, the list
    /// is exhausted, or it was never loaded.
    pub async fn load_more(&self) -> Result<usize, AppError> {
        let (query, ticket) = {
            let mut state = lock(&self.state);
            match state.window.begin_load_more() {
                Some(ticket) => (state.query.clone(), ticket),
                None => return Ok(0),
            }
        };

        let result = self.api.fetch_views(&query, ticket.cursor()).await;
        let completion = lock(&self.state).window.complete(ticket, result);
        self.settle(completion)
    }

    fn settle(&self, completion: Result<Completion, AppError>) -> Result<usize, AppError> {
        match completion {
            Ok(Completion::Applied(added)) => Ok(added),
            Ok(Completion::Stale) => Ok(0),
            Err(e) => {
                tracing::warn!("Failed to load views: {}", e);
                self.session.report(&e);
                Err(e)
            }
        }
    }

    /// Whether a reader at `position` should trigger `load_more`.
    pub fn should_prefetch(&self, position: usize) -> bool {
        lock(&self.state).window.near_end(position)
    }

    /// Reflect a vote cast elsewhere in every copy of the view held here.
    pub fn apply_vote(&self, view_id: ViewId, option_id: OptionId) -> usize {
        lock(&self.state)
            .window
            .update_where(&view_id, |view| view.apply_vote(option_id))
    }

    pub fn apply_unvote(&self, view_id: ViewId) -> usize {
        lock(&self.state)
            .window
            .update_where(&view_id, |view| view.apply_unvote().is_some())
    }

    pub fn apply_event(&self, event: &VoteEvent) -> usize {
        match *event {
            VoteEvent::Voted { view_id, option_id } => self.apply_vote(view_id, option_id),
            VoteEvent::Unvoted { view_id } => self.apply_unvote(view_id),
        }
    }

    /// Views among those loaded whose title, option text or author nickname contains
    /// `query`. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<View> {
        lock(&self.state)
            .window
            .items()
            .iter()
            .filter(|view| view.matches_query(query))
            .cloned()
            .collect()
    }

    /// A standalone poll for a card, seeded from the loaded copy.
    pub fn poll(&self, view_id: ViewId) -> Option<PollHandle> {
        self.get(view_id).map(PollState::shared)
    }

    fn ensure_signed_in(&self, reason: &str) -> Result<(), AppError> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        self.session.require_login(reason);
        Err(AppError::login_required())
    }

    /// Publish a new view, then reload the list so it shows in server order.
    pub async fn create(&self, view: NewView) -> Result<Option<View>, AppError> {
        self.ensure_signed_in("Login required to create a view")?;
        let view = view.validate()?;

        let created = self
            .api
            .create_view(&view)
            .await
            .inspect_err(|e| self.session.report(e))?;
        tracing::info!("Created view {:?}", created.as_ref().map(|v| v.id));

        self.refresh().await?;
        Ok(created)
    }

    /// Save an edit and update the loaded copy in place.
    pub async fn update(&self, view_id: ViewId, edit: ViewEdit) -> Result<(), AppError> {
        self.ensure_signed_in("Login required to edit a view")?;
        let edit = edit.validate()?;

        let saved = self
            .api
            .update_view(view_id, &edit)
            .await
            .inspect_err(|e| self.session.report(e))?;

        let mut state = lock(&self.state);
        match saved {
            Some(view) => {
                state.window.replace(view);
            }
            None => {
                state.window.update_where(&view_id, |view| {
                    edit.apply_to(view);
                    true
                });
            }
        }
        Ok(())
    }

    pub async fn remove(&self, view_id: ViewId) -> Result<(), AppError> {
        self.ensure_signed_in("Login required to delete a view")?;
        self.api
            .delete_view(view_id)
            .await
            .inspect_err(|e| self.session.report(e))?;
        lock(&self.state).window.remove(&view_id);
        Ok(())
    }
}
