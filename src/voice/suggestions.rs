use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::builder::ItemKind;

/// Newest-first list that drops its oldest entry past `limit`.
#[derive(Debug, Clone)]
pub struct RecentFeed<T> {
    entries: VecDeque<T>,
    limit: usize,
}

impl<T> RecentFeed<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    /// Remove and return the first entry matching `pred`.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let idx = self.entries.iter().position(pred)?;
        self.entries.remove(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Links an item created from the voice channel back to its backend record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionEntry {
    pub ui_id: String,
    pub backend_id: Option<String>,
    pub title: String,
    pub kind: ItemKind,
    pub created_at: DateTime<Utc>,
}

/// Raw tool output kept for on-screen inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub timestamp: String,
    pub kind: Option<String>,
    pub data: Value,
}
