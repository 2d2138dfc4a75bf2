//! Cursor-paginated window of materialized items.
//!
//! `CursorWindow` is the synchronous half of a paginated list: it owns the items, the
//! cursor and the load state, and hands out tickets for fetches. The async half (who
//! actually fetches) lives in `ViewFeed` and `CommentThread`.
//!
//! ```text
//! Empty --begin_refresh--> Loading --complete--> Ready --begin_load_more--> LoadingMore
//!   ^                                              |  ^                         |
//!   +---------------- reset / failed refresh ------+  +--------- complete ------+
//! ```
//!
//! Every reset bumps a generation counter. A ticket from an older generation is stale:
//! its completion is dropped so a page fetched for old parameters never lands in the
//! new list.

use std::collections::HashSet;
use std::hash::Hash;

use crate::errors::AppError;
use crate::models::{Comment, Page, View};

/// How close to the end of the window the consumer should ask for more.
pub const PREFETCH_DISTANCE: usize = 3;

/// Items with a stable identity inside a window.
pub trait Keyed {
    type Key: Eq + Hash + Clone;
    fn key(&self) -> Self::Key;
}

impl Keyed for View {
    type Key = i64;
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Comment {
    type Key = i64;
    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing materialized; a refresh is due.
    Empty,
    /// First page in flight.
    Loading,
    Ready,
    /// Next page in flight.
    LoadingMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    Append,
}

/// Permission to run one fetch, tied to the window generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    kind: FetchKind,
    cursor: Option<String>,
}

impl Ticket {
    /// Cursor to send; `None` for the first page.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// What a completion did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The page was applied; carries the number of items added.
    Applied(usize),
    /// The window was reset after the ticket was issued; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct CursorWindow<T> {
    items: Vec<T>,
    cursor: Option<String>,
    has_next: bool,
    state: LoadState,
    generation: u64,
    error: Option<String>,
}

impl<T> Default for CursorWindow<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_next: false,
            state: LoadState::Empty,
            generation: 0,
            error: None,
        }
    }
}

impl<T: Keyed> CursorWindow<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Message of the last failed fetch, cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading | LoadState::LoadingMore)
    }

    /// Drop everything and invalidate outstanding tickets.
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = None;
        self.has_next = false;
        self.state = LoadState::Empty;
        self.error = None;
        self.generation += 1;
    }

    /// Reset and hand out a ticket for the first page.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.reset();
        self.state = LoadState::Loading;
        Ticket {
            generation: self.generation,
            kind: FetchKind::Initial,
            cursor: None,
        }
    }

    /// A ticket for the next page, or `None` when there is nothing to do: a load is
    /// already running, the server reported no more pages, or no cursor is held.
    pub fn begin_load_more(&mut self) -> Option<Ticket> {
        if self.state != LoadState::Ready || !self.has_next {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.state = LoadState::LoadingMore;
        Some(Ticket {
            generation: self.generation,
            kind: FetchKind::Append,
            cursor: Some(cursor),
        })
    }

    /// Apply the outcome of a ticketed fetch.
    ///
    /// A failed first page leaves the window empty; a failed next page leaves items and
    /// cursor untouched so the same page can be retried. Either way the error is
    /// returned to the caller.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Page<T>, AppError>,
    ) -> Result<Completion, AppError> {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding page for generation {} (now {})",
                ticket.generation,
                self.generation
            );
            return Ok(Completion::Stale);
        }

        match (ticket.kind, result) {
            (FetchKind::Initial, Ok(page)) => {
                self.items.clear();
                let added = self.append_unique(page.data);
                self.accept_meta(page.meta.has_next, page.meta.next_cursor);
                Ok(Completion::Applied(added))
            }
            (FetchKind::Append, Ok(page)) => {
                let added = self.append_unique(page.data);
                self.accept_meta(page.meta.has_next, page.meta.next_cursor);
                Ok(Completion::Applied(added))
            }
            (FetchKind::Initial, Err(e)) => {
                self.items.clear();
                self.cursor = None;
                self.has_next = false;
                self.state = LoadState::Empty;
                self.error = Some(e.message());
                Err(e)
            }
            (FetchKind::Append, Err(e)) => {
                self.state = LoadState::Ready;
                self.error = Some(e.message());
                Err(e)
            }
        }
    }

    fn accept_meta(&mut self, has_next: bool, next_cursor: Option<String>) {
        self.has_next = has_next && next_cursor.is_some();
        self.cursor = next_cursor;
        self.state = LoadState::Ready;
        self.error = None;
    }

    fn append_unique(&mut self, incoming: Vec<T>) -> usize {
        let mut seen: HashSet<T::Key> = self.items.iter().map(Keyed::key).collect();
        let before = self.items.len();
        for item in incoming {
            if seen.insert(item.key()) {
                self.items.push(item);
            } else {
                tracing::debug!("Skipping duplicate item in page");
            }
        }
        self.items.len() - before
    }

    /// Whether a consumer at `position` is close enough to the end to prefetch.
    pub fn near_end(&self, position: usize) -> bool {
        !self.items.is_empty()
            && self.has_next
            && self.state == LoadState::Ready
            && position.saturating_add(PREFETCH_DISTANCE) >= self.items.len()
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Mutate every materialized copy of `key`; returns how many were touched.
    pub fn update_where<F>(&mut self, key: &T::Key, mut f: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        self.items
            .iter_mut()
            .filter(|item| &item.key() == key)
            .map(|item| f(item))
            .filter(|changed| *changed)
            .count()
    }

    pub fn replace(&mut self, item: T) -> bool {
        let key = item.key();
        match self.items.iter_mut().find(|i| i.key() == key) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &T::Key) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.key() != key);
        self.items.len() != before
    }

    /// Put a freshly created item at the front.
    pub fn prepend(&mut self, item: T) {
        let key = item.key();
        self.items.retain(|i| i.key() != key);
        self.items.insert(0, item);
    }
}
