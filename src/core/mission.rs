use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mission kinds the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Task,
    Project,
    Note,
    Reminder,
}

impl MissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Note => "note",
            Self::Reminder => "reminder",
        }
    }

    /// Exact, case-sensitive match on the wire value.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Self::Task),
            "project" => Some(Self::Project),
            "note" => Some(Self::Note),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}

/// JavaScript truthiness, since assistant payloads are untyped.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The field if present and truthy.
pub fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// Render a scalar for display or keys: strings verbatim, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A mission-shaped object found inside an assistant message.
#[derive(Debug, Clone, Copy)]
pub struct MissionPayload<'a> {
    raw: &'a Value,
}

impl<'a> MissionPayload<'a> {
    /// Wrap an object that has a truthy `title`. Anything else is rejected.
    pub fn new(raw: &'a Value) -> Option<Self> {
        truthy_field(raw, "title")?;
        Some(Self { raw })
    }

    /// Whether `raw` passes the mission shape check: truthy title and a known `type`.
    pub fn matches(raw: &Value) -> bool {
        truthy_field(raw, "title").is_some()
            && raw
                .get("type")
                .and_then(Value::as_str)
                .and_then(MissionType::from_wire)
                .is_some()
    }

    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    pub fn title(&self) -> String {
        self.raw.get("title").map(display_value).unwrap_or_default()
    }

    /// The declared type string, defaulting to `task` when absent or falsy.
    pub fn type_name(&self) -> String {
        truthy_field(self.raw, "type")
            .map(display_value)
            .unwrap_or_else(|| MissionType::Task.as_str().to_string())
    }

    /// The type used to choose which list the mission lands in.
    /// Unknown strings build a task, matching the default branch.
    pub fn mission_type(&self) -> MissionType {
        MissionType::from_wire(&self.type_name()).unwrap_or(MissionType::Task)
    }

    pub fn body(&self) -> Option<String> {
        truthy_field(self.raw, "body").map(display_value)
    }

    /// `personal_deadline`, else `true_deadline`, as sent.
    pub fn deadline_value(&self) -> Option<&'a Value> {
        truthy_field(self.raw, "personal_deadline").or_else(|| truthy_field(self.raw, "true_deadline"))
    }

    /// The deadline rendered as text, for dedup keys.
    pub fn deadline(&self) -> Option<String> {
        self.deadline_value().map(display_value)
    }

    pub fn backend_id(&self) -> Option<String> {
        truthy_field(self.raw, "id").map(display_value)
    }
}
