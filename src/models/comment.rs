//! Comment model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentAuthor {
    pub id: i64,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: CommentAuthor,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for posting a comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewComment {
    #[serde(default)]
    pub content: String,
}

impl NewComment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Trim the content, rejecting an empty comment.
    pub fn validate(&self) -> Result<NewComment, AppError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        Ok(NewComment::new(content))
    }

    /// Body in the upstream API's nested form.
    pub fn to_upstream_body(&self) -> serde_json::Value {
        serde_json::json!({ "comment": { "content": self.content } })
    }
}
