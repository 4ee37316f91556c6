use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub body: Vec<String>,
    pub backend_id: Option<String>,
}

/// Split a note body into trimmed, non-blank lines.
pub fn body_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(body_lines("Line 1\n\nLine 2"), vec!["Line 1", "Line 2"]);
        assert_eq!(body_lines("  padded  \r\n   \n"), vec!["padded"]);
        assert!(body_lines("").is_empty());
    }
}
