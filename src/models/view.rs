//! View (poll) model.

use serde::{Deserialize, Serialize};

pub type ViewId = i64;
pub type OptionId = i64;

/// One selectable answer within a view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewOption {
    pub id: OptionId,
    pub content: String,
    pub votes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewAuthor {
    pub id: i64,
    pub nickname: String,
}

/// The caller's own vote on a view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MyVote {
    pub option_id: OptionId,
}

/// A user-created question with selectable options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct View {
    pub id: ViewId,
    pub title: String,
    pub author: ViewAuthor,
    pub options: Vec<ViewOption>,
    pub total_votes: i64,
    #[serde(default)]
    pub my_vote: Option<MyVote>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub comments_count: i64,
}

impl View {
    pub fn option(&self, option_id: OptionId) -> Option<&ViewOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn option_mut(&mut self, option_id: OptionId) -> Option<&mut ViewOption> {
        self.options.iter_mut().find(|o| o.id == option_id)
    }

    /// The option the caller voted for, if it still exists in this view.
    ///
    /// A `my_vote` pointing at an option that is no longer present is shown as "no vote"
    /// but left as-is until the next refresh.
    pub fn voted_option(&self) -> Option<OptionId> {
        self.my_vote
            .map(|v| v.option_id)
            .filter(|id| self.option(*id).is_some())
    }

    pub fn has_voted(&self) -> bool {
        self.voted_option().is_some()
    }

    /// Sum of all option counters.
    pub fn counted_votes(&self) -> i64 {
        self.options.iter().map(|o| o.votes_count).sum()
    }

    /// Total equals the sum of option counters.
    pub fn is_consistent(&self) -> bool {
        self.total_votes == self.counted_votes()
    }

    /// Share of the total for a vote count, rounded to the nearest whole percent.
    pub fn percentage(&self, votes: i64) -> u32 {
        if self.total_votes <= 0 {
            return 0;
        }
        ((votes as f64 / self.total_votes as f64) * 100.0).round() as u32
    }

    /// Options holding the highest count. Empty until the caller has voted.
    pub fn leading_options(&self) -> Vec<OptionId> {
        if !self.has_voted() {
            return Vec::new();
        }
        let max = self.options.iter().map(|o| o.votes_count).max().unwrap_or(0);
        self.options
            .iter()
            .filter(|o| o.votes_count == max)
            .map(|o| o.id)
            .collect()
    }

    /// Record the caller's vote for `option_id`.
    ///
    /// Moving an existing vote keeps the total unchanged. Returns `false` when nothing
    /// changed (already voted for that option, or the option is unknown).
    pub fn apply_vote(&mut self, option_id: OptionId) -> bool {
        if self.option(option_id).is_none() || self.voted_option() == Some(option_id) {
            return false;
        }

        match self.voted_option() {
            Some(previous) => {
                if let Some(opt) = self.option_mut(previous) {
                    opt.votes_count = (opt.votes_count - 1).max(0);
                }
            }
            None => self.total_votes += 1,
        }

        if let Some(opt) = self.option_mut(option_id) {
            opt.votes_count += 1;
        }
        self.my_vote = Some(MyVote { option_id });
        true
    }

    /// Remove the caller's vote. Returns the option it was cast for.
    pub fn apply_unvote(&mut self) -> Option<OptionId> {
        let previous = self.voted_option()?;
        if let Some(opt) = self.option_mut(previous) {
            opt.votes_count = (opt.votes_count - 1).max(0);
        }
        self.total_votes = (self.total_votes - 1).max(0);
        self.my_vote = None;
        Some(previous)
    }

    /// Case-insensitive match of a search query against title, options and author.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .options
                .iter()
                .any(|o| o.content.to_lowercase().contains(&query))
            || self.author.nickname.to_lowercase().contains(&query)
    }
}

/// Request body for casting a vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRequest {
    pub option_id: OptionId,
}

#[cfg(test)]
pub(crate) fn sample_view(id: ViewId, options: &[(OptionId, i64)]) -> View {
    View {
        id,
        title: format!("Question {}", id),
        author: ViewAuthor {
            id: 7,
            nickname: "mina".to_string(),
        },
        options: options
            .iter()
            .map(|(oid, votes)| ViewOption {
                id: *oid,
                content: format!("Option {}", oid),
                votes_count: *votes,
            })
            .collect(),
        total_votes: options.iter().map(|(_, v)| v).sum(),
        my_vote: None,
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
        edited: false,
        comments_count: 0,
    }
}
