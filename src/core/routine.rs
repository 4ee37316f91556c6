use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mission::{display_value, truthy_field};

/// Shown when a routine has no readable day list.
pub const CUSTOM_SCHEDULE: &str = "Custom schedule";

pub const ROUTINE_EMOJI: &str = "⚡";

/// One `{day, time}` slot of a routine schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub day: String,
    pub time: Option<String>,
}

/// Parse a schedule that arrives either JSON-encoded or already as an array.
///
/// Entries without a string `day` are skipped. A non-array value parses to an
/// empty schedule; only undecodable JSON text is an error.
pub fn parse_schedule(value: &Value) -> Result<Vec<ScheduleEntry>, String> {
    let decoded;
    let items = match value {
        Value::String(text) => {
            decoded = serde_json::from_str::<Value>(text)
                .map_err(|e| format!("Invalid schedule JSON: {}", e))?;
            &decoded
        }
        other => other,
    };

    let Some(items) = items.as_array() else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let day = item.get("day")?.as_str()?.to_string();
            let time = item.get("time").and_then(Value::as_str).map(str::to_string);
            Some(ScheduleEntry { day, time })
        })
        .collect())
}

/// A routine-shaped object found inside an assistant message.
#[derive(Debug, Clone, Copy)]
pub struct RoutinePayload<'a> {
    raw: &'a Value,
}

impl<'a> RoutinePayload<'a> {
    pub fn new(raw: &'a Value) -> Option<Self> {
        truthy_field(raw, "title")?;
        Some(Self { raw })
    }

    /// Truthy title plus a truthy `schedule` or `frequency`.
    pub fn matches(raw: &Value) -> bool {
        truthy_field(raw, "title").is_some()
            && (truthy_field(raw, "schedule").is_some() || truthy_field(raw, "frequency").is_some())
    }

    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    pub fn title(&self) -> String {
        self.raw.get("title").map(display_value).unwrap_or_default()
    }

    /// The parsed schedule. Absent schedules are empty; malformed ones are logged and empty.
    pub fn schedule(&self) -> Vec<ScheduleEntry> {
        let Some(raw) = truthy_field(self.raw, "schedule") else {
            return Vec::new();
        };
        parse_schedule(raw).unwrap_or_else(|e| {
            log::warn!("Routine '{}': {}", self.title(), e);
            Vec::new()
        })
    }

    pub fn backend_id(&self) -> Option<String> {
        truthy_field(self.raw, "id").map(display_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineItem {
    pub id: String,
    pub emoji: String,
    pub title: String,
    /// Comma-joined day names, or [`CUSTOM_SCHEDULE`].
    pub frequency: String,
    /// Time of the first schedule slot, empty when unknown.
    pub time: String,
    pub enabled: bool,
    pub backend_id: Option<String>,
}

impl RoutineItem {
    pub fn from_schedule(
        id: String,
        title: impl Into<String>,
        schedule: &[ScheduleEntry],
        backend_id: Option<String>,
    ) -> Self {
        let days: Vec<&str> = schedule
            .iter()
            .map(|s| s.day.as_str())
            .filter(|d| !d.is_empty())
            .collect();
        let frequency = if days.is_empty() {
            CUSTOM_SCHEDULE.to_string()
        } else {
            days.join(", ")
        };
        let time = schedule
            .first()
            .and_then(|s| s.time.clone())
            .unwrap_or_default();

        Self {
            id,
            emoji: ROUTINE_EMOJI.to_string(),
            title: title.into(),
            frequency,
            time,
            enabled: true,
            backend_id,
        }
    }
}
