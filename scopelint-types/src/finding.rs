use serde::{Deserialize, Serialize};

/// One issue reported by a linter.
///
/// Every field is optional because tools differ in what they report. An absent
/// field is distinct from a reported zero or empty string, so nothing is ever
/// defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,

    /// Title-cased severity, e.g. `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Rule identifier, e.g. `E501`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Finding {
    /// Ordering key: absent line/column sort as `-1`, before any reported value.
    pub fn sort_key(&self) -> (i64, i64) {
        (
            self.line.map_or(-1, i64::from),
            self.column.map_or(-1, i64::from),
        )
    }

    /// True when no field was captured at all.
    pub fn is_blank(&self) -> bool {
        self.line.is_none()
            && self.column.is_none()
            && self.severity.is_none()
            && self.message_id.is_none()
            && self.message.is_none()
    }
}
