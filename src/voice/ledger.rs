use std::collections::HashSet;

use crate::core::mission::MissionPayload;
use crate::core::routine::{RoutinePayload, ScheduleEntry};

/// Set of keys already applied during the current screen session.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    seen: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Record a key. Returns false if it was already present.
    pub fn mark_seen(&mut self, key: impl Into<String>) -> bool {
        self.seen.insert(key.into())
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// `type|title|deadline-date|body-prefix`, all trimmed and lowercased.
///
/// The deadline is cut to its first 10 characters (the date part of an ISO
/// string) before normalizing; the body is normalized before taking 50 characters.
pub fn mission_key(mission: &MissionPayload<'_>) -> String {
    let kind = normalize(&mission.type_name());
    let title = normalize(&mission.title());
    let deadline = normalize(&take_chars(&mission.deadline().unwrap_or_default(), 10));
    let body = take_chars(&normalize(&mission.body().unwrap_or_default()), 50);
    format!("{}|{}|{}|{}", kind, title, deadline, body)
}

/// `routine|title|day,day,...` with day names normalized and sorted.
pub fn routine_key(routine: &RoutinePayload<'_>, schedule: &[ScheduleEntry]) -> String {
    let mut days: Vec<String> = schedule
        .iter()
        .map(|s| normalize(&s.day))
        .filter(|d| !d.is_empty())
        .collect();
    days.sort();
    format!("routine|{}|{}", normalize(&routine.title()), days.join(","))
}
