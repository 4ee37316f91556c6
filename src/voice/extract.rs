use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::mission::MissionPayload;
use crate::core::routine::RoutinePayload;

/// Containers the SDK uses for tool-call output.
pub const TOOL_RESULT_KEYS: [&str; 4] = ["toolCallResults", "toolCallResult", "results", "result"];

/// Nesting beyond this is not searched.
pub const MAX_DEPTH: usize = 64;

/// Where in a message to look for embedded payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractScope {
    /// Only under [`TOOL_RESULT_KEYS`].
    #[default]
    ToolResults,
    /// The whole message, including its top level.
    WholeMessage,
}

#[derive(Debug, Default)]
pub struct Extracted<'a> {
    pub missions: Vec<MissionPayload<'a>>,
    pub routines: Vec<RoutinePayload<'a>>,
}

impl Extracted<'_> {
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty() && self.routines.is_empty()
    }
}

/// Find every mission-like and routine-like object in `message`. Array order is kept.
///
/// An object can land in both lists.
pub fn extract(message: &Value, scope: ExtractScope) -> Extracted<'_> {
    let mut out = Extracted::default();
    match scope {
        ExtractScope::WholeMessage => visit(message, 0, &mut out),
        ExtractScope::ToolResults => {
            for key in TOOL_RESULT_KEYS {
                if let Some(root) = message.get(key) {
                    visit(root, 0, &mut out);
                }
            }
        }
    }
    out
}

fn visit<'a>(value: &'a Value, depth: usize, out: &mut Extracted<'a>) {
    if depth > MAX_DEPTH {
        log::debug!("Payload nesting exceeds {} levels, not descending", MAX_DEPTH);
        return;
    }

    let children: Box<dyn Iterator<Item = &'a Value> + 'a> = match value {
        Value::Object(map) => {
            if MissionPayload::matches(value) {
                out.missions.extend(MissionPayload::new(value));
            }
            if RoutinePayload::matches(value) {
                out.routines.extend(RoutinePayload::new(value));
            }
            Box::new(map.values())
        }
        Value::Array(items) => Box::new(items.iter()),
        _ => return,
    };

    for child in children {
        if child.is_object() || child.is_array() {
            visit(child, depth + 1, out);
        }
    }
}
