use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderItem {
    pub id: String,
    pub title: String,
    /// "9:05 AM"
    pub time: String,
    /// "Saturday, November 1"
    pub date: String,
    pub enabled: bool,
    pub backend_id: Option<String>,
}
