use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A saved recording's metadata
///
/// The registry service itself only writes `name`; recorders persisting
/// locally also fill `id`, `date` and `duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    /// Length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Fields written by other tools, kept as-is on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordingEntry {
    /// Entry carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            date: None,
            duration: None,
            extra: Map::new(),
        }
    }

    /// Entry with a fresh id, the current time and a duration
    pub fn with_metadata(name: impl Into<String>, duration: u64) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            date: Some(Utc::now()),
            duration: Some(duration),
            ..Self::named(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entry_serializes_name_only() {
        let json = serde_json::to_string(&RecordingEntry::named("standup")).unwrap();
        assert_eq!(json, r#"{"name":"standup"}"#);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"name":"x","mood":"happy","duration":3}"#;
        let entry: RecordingEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.duration, Some(3));
        assert_eq!(entry.extra.get("mood"), Some(&Value::from("happy")));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["mood"], "happy");
    }

    #[test]
    fn test_with_metadata_fills_everything() {
        let entry = RecordingEntry::with_metadata("demo", 12);
        assert!(entry.id.is_some());
        assert!(entry.date.is_some());
        assert_eq!(entry.duration, Some(12));
    }
}
