use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub name: String,
    pub completed: bool,
}

/// A task or project card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    /// Long-form deadline date, or [`super::format::NO_DEADLINE`].
    pub date: String,
    pub enabled: bool,
    pub completed: bool,
    pub subtasks: Vec<Subtask>,
    pub backend_id: Option<String>,
}

impl TaskItem {
    pub fn new(id: String, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            date: date.into(),
            enabled: true,
            completed: false,
            subtasks: Vec::new(),
            backend_id: None,
        }
    }

    /// Flip a subtask. Returns false if no subtask has that id.
    pub fn toggle_subtask(&mut self, subtask_id: &str) -> bool {
        match self.subtasks.iter_mut().find(|s| s.id == subtask_id) {
            Some(subtask) => {
                subtask.completed = !subtask.completed;
                true
            }
            None => false,
        }
    }

    pub fn subtasks_done(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}
