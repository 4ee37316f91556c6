use serde::{Deserialize, Serialize};

use crate::core::mission::MissionType;

/// `{ "data": T }` wrapper used by every backend response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MissionType,
    pub user_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub parent_project_id: Option<String>,
    #[serde(default)]
    pub parent_routine_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub true_deadline: Option<String>,
    #[serde(default)]
    pub personal_deadline: Option<String>,
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub heaviness: Option<i32>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update for `PUT /missions/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MissionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}
