//! Push channel envelope
//!
//! Each server-sent event carries one JSON-encoded [`IssueUpdate`] in its
//! `data:` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Kind of change announced on the push channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueEventType {
    IssueCreated,
    IssueUpdated,
    IssueUpvoted,
    /// A type this build does not know about
    Other(String),
}

impl IssueEventType {
    pub fn as_str(&self) -> &str {
        match self {
            IssueEventType::IssueCreated => "ISSUE_CREATED",
            IssueEventType::IssueUpdated => "ISSUE_UPDATED",
            IssueEventType::IssueUpvoted => "ISSUE_UPVOTED",
            IssueEventType::Other(raw) => raw,
        }
    }
}

impl From<&str> for IssueEventType {
    fn from(raw: &str) -> Self {
        match raw {
            "ISSUE_CREATED" => IssueEventType::IssueCreated,
            "ISSUE_UPDATED" => IssueEventType::IssueUpdated,
            "ISSUE_UPVOTED" => IssueEventType::IssueUpvoted,
            other => IssueEventType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IssueEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueEventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueEventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(IssueEventType::from(raw.as_str()))
    }
}

/// One message on the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(rename = "type")]
    pub kind: IssueEventType,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl IssueUpdate {
    /// Stamp an event with the current time
    pub fn new(kind: IssueEventType, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Some(Utc::now()),
        }
    }

    /// String field of the payload, if present
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_types() {
        let update: IssueUpdate =
            serde_json::from_str(r#"{"type":"ISSUE_UPDATED","data":{"status":"resolved"}}"#)
                .unwrap();
        assert_eq!(update.kind, IssueEventType::IssueUpdated);
        assert_eq!(update.data_str("status"), Some("resolved"));
        assert!(update.timestamp.is_none());
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let update: IssueUpdate =
            serde_json::from_str(r#"{"type":"ISSUE_DELETED","data":null}"#).unwrap();
        assert_eq!(update.kind, IssueEventType::Other("ISSUE_DELETED".into()));
        assert_eq!(update.kind.as_str(), "ISSUE_DELETED");
    }

    #[test]
    fn test_serialize_shape() {
        let update = IssueUpdate::new(IssueEventType::IssueCreated, json!({"text": "Pothole"}));
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "ISSUE_CREATED");
        assert_eq!(value["data"]["text"], "Pothole");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_missing_data_defaults_to_null() {
        let update: IssueUpdate = serde_json::from_str(r#"{"type":"ISSUE_UPVOTED"}"#).unwrap();
        assert!(update.data.is_null());
        assert_eq!(update.data_str("text"), None);
    }
}
