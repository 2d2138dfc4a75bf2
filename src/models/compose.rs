//! Request bodies for creating and editing views, with their validation rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{OptionId, View, ViewOption};
use crate::errors::AppError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// Request body for creating a new view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewView {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl NewView {
    pub fn new(title: impl Into<String>, options: &[&str]) -> Self {
        Self {
            title: title.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Normalize and check the form: trimmed title, blank options dropped,
    /// between `MIN_OPTIONS` and `MAX_OPTIONS` distinct options.
    pub fn validate(&self) -> Result<NewView, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let options: Vec<String> = self
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if options.len() < MIN_OPTIONS {
            return Err(AppError::Validation(format!(
                "At least {} options are required",
                MIN_OPTIONS
            )));
        }
        if options.len() > MAX_OPTIONS {
            return Err(AppError::Validation(format!(
                "At most {} options are allowed",
                MAX_OPTIONS
            )));
        }

        let unique: HashSet<&str> = options.iter().map(String::as_str).collect();
        if unique.len() != options.len() {
            return Err(AppError::Validation("Duplicate options".to_string()));
        }

        Ok(NewView {
            title: title.to_string(),
            options,
        })
    }

    /// Body in the upstream API's nested-attributes form.
    pub fn to_upstream_body(&self) -> serde_json::Value {
        let attributes: Vec<_> = self
            .options
            .iter()
            .map(|content| serde_json::json!({ "content": content }))
            .collect();
        serde_json::json!({
            "view": {
                "title": self.title,
                "view_options_attributes": attributes,
            }
        })
    }
}

/// One option row in an edit: existing (`id` set) or new, possibly marked for removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OptionId>,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "_destroy", default)]
    pub destroy: bool,
}

impl OptionEdit {
    pub fn keep(id: OptionId, content: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            content: content.into(),
            destroy: false,
        }
    }

    pub fn add(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            destroy: false,
        }
    }

    pub fn remove(id: OptionId) -> Self {
        Self {
            id: Some(id),
            content: String::new(),
            destroy: true,
        }
    }
}

/// Request body for editing an existing view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewEdit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: Vec<OptionEdit>,
}

impl ViewEdit {
    /// Start an edit from the current state of a view.
    pub fn from_view(view: &View) -> Self {
        Self {
            title: view.title.clone(),
            options: view
                .options
                .iter()
                .map(|o| OptionEdit::keep(o.id, o.content.clone()))
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<ViewEdit, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let mut options = Vec::with_capacity(self.options.len());
        for opt in &self.options {
            let content = opt.content.trim();
            if opt.destroy {
                // existing rows are sent so the API can drop them; new ones just vanish
                if opt.id.is_some() {
                    options.push(OptionEdit {
                        id: opt.id,
                        content: content.to_string(),
                        destroy: true,
                    });
                }
                continue;
            }
            if content.is_empty() {
                return Err(AppError::Validation("Options cannot be empty".to_string()));
            }
            options.push(OptionEdit {
                id: opt.id,
                content: content.to_string(),
                destroy: false,
            });
        }

        let live: Vec<&str> = options
            .iter()
            .filter(|o| !o.destroy)
            .map(|o| o.content.as_str())
            .collect();
        if live.len() < MIN_OPTIONS {
            return Err(AppError::Validation(format!(
                "At least {} options are required",
                MIN_OPTIONS
            )));
        }
        if live.len() > MAX_OPTIONS {
            return Err(AppError::Validation(format!(
                "At most {} options are allowed",
                MAX_OPTIONS
            )));
        }
        let unique: HashSet<&str> = live.iter().copied().collect();
        if unique.len() != live.len() {
            return Err(AppError::Validation("Duplicate options".to_string()));
        }

        Ok(ViewEdit {
            title: title.to_string(),
            options,
        })
    }

    /// Body in the upstream API's nested-attributes form. New options carry no id and
    /// no `_destroy` flag.
    pub fn to_upstream_body(&self) -> serde_json::Value {
        let attributes: Vec<_> = self
            .options
            .iter()
            .map(|opt| match opt.id {
                Some(id) => serde_json::json!({
                    "id": id,
                    "content": opt.content,
                    "_destroy": opt.destroy,
                }),
                None => serde_json::json!({ "content": opt.content }),
            })
            .collect();
        serde_json::json!({
            "view": {
                "title": self.title,
                "view_options_attributes": attributes,
            }
        })
    }

    /// Apply a confirmed edit locally when the API answered without a view body.
    /// Kept options retain their counts; new options start at zero with a
    /// placeholder id until the next refresh. Votes on removed options leave the
    /// total.
    pub fn apply_to(&self, view: &mut View) {
        let mut placeholder = -1;
        let options = self
            .options
            .iter()
            .filter(|o| !o.destroy)
            .map(|o| match o.id {
                Some(id) => ViewOption {
                    id,
                    content: o.content.clone(),
                    votes_count: view.option(id).map(|v| v.votes_count).unwrap_or(0),
                },
                None => {
                    placeholder -= 1;
                    ViewOption {
                        id: placeholder + 1,
                        content: o.content.clone(),
                        votes_count: 0,
                    }
                }
            })
            .collect();
        view.title = self.title.clone();
        view.options = options;
        view.total_votes = view.counted_votes();
        view.edited = true;
    }
}
