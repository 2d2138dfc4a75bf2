//! Pagination envelope and list query parameters.

use serde::{Deserialize, Serialize};

/// `meta` block of a cursor-paginated response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub per_page: u32,
    pub has_next: bool,
    /// Opaque; passed back verbatim to fetch the next page.
    pub next_cursor: Option<String>,
}

/// `{ data: T[], meta: {...} }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// `{ data: T }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Latest,
    Popular,
}

impl SortType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortType::Latest => "latest",
            SortType::Popular => "popular",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VoteFilter {
    #[default]
    All,
    Voted,
    NotVoted,
}

impl VoteFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteFilter::All => "all",
            VoteFilter::Voted => "voted",
            VoteFilter::NotVoted => "not_voted",
        }
    }
}

/// Default page size used by the front end.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Parameters selecting one server-side ordering of views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewQuery {
    pub sort: SortType,
    pub vote_filter: VoteFilter,
    pub category: Option<i64>,
    /// `"me"` restricts the list to the caller's own views.
    pub author: Option<String>,
    pub per_page: Option<u32>,
}

impl ViewQuery {
    pub fn mine() -> Self {
        Self {
            author: Some("me".to_string()),
            ..Self::default()
        }
    }

    /// Query-string pairs for one page request.
    pub fn to_params(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sort", self.sort.as_str().to_string()),
            (
                "per_page",
                self.per_page.unwrap_or(DEFAULT_PER_PAGE).to_string(),
            ),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        if let Some(author) = &self.author {
            params.push(("author", author.clone()));
        }
        if self.vote_filter != VoteFilter::All {
            params.push(("vote_filter", self.vote_filter.as_str().to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        params
    }
}
