//! Toast notifications derived from push updates

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::event::{IssueEventType, IssueUpdate};
use shared::util::snippet;

/// Characters of issue text shown in a "new issue" toast
const SNIPPET_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: IssueEventType,
    pub title: String,
    pub description: String,
    pub received_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_update(update: &IssueUpdate) -> Self {
        let (title, description) = match &update.kind {
            IssueEventType::IssueCreated => {
                let text = update
                    .data_str("text")
                    .or_else(|| update.data_str("title"))
                    .unwrap_or("New issue in your area");
                (
                    "New Issue Reported".to_string(),
                    format!("A new issue was reported: {}", snippet(text, SNIPPET_CHARS)),
                )
            }
            IssueEventType::IssueUpdated => {
                let status = update.data_str("status").unwrap_or("unknown");
                (
                    "Issue Updated".to_string(),
                    format!("Issue status changed to: {status}"),
                )
            }
            IssueEventType::IssueUpvoted => (
                "Issue Upvoted".to_string(),
                "An issue has been upvoted!".to_string(),
            ),
            IssueEventType::Other(_) => (
                "Update Received".to_string(),
                "Data has been updated.".to_string(),
            ),
        };

        Self {
            kind: update.kind.clone(),
            title,
            description,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(kind: &str, data: serde_json::Value) -> IssueUpdate {
        IssueUpdate::new(IssueEventType::from(kind), data)
    }

    #[test]
    fn test_status_change_description() {
        let n = Notification::from_update(&update("ISSUE_UPDATED", json!({"status": "resolved"})));
        assert_eq!(n.title, "Issue Updated");
        assert_eq!(n.description, "Issue status changed to: resolved");
    }

    #[test]
    fn test_created_truncates_long_text() {
        let text = "x".repeat(80);
        let n = Notification::from_update(&update("ISSUE_CREATED", json!({ "text": text })));
        assert_eq!(n.title, "New Issue Reported");
        assert_eq!(
            n.description,
            format!("A new issue was reported: {}...", "x".repeat(50))
        );

        let short = Notification::from_update(&update("ISSUE_CREATED", json!({"text": "Pothole"})));
        assert_eq!(short.description, "A new issue was reported: Pothole");
    }

    #[test]
    fn test_created_text_fallbacks() {
        let titled = Notification::from_update(&update("ISSUE_CREATED", json!({"title": "Dark street"})));
        assert_eq!(titled.description, "A new issue was reported: Dark street");

        let bare = Notification::from_update(&update("ISSUE_CREATED", json!({})));
        assert_eq!(
            bare.description,
            "A new issue was reported: New issue in your area"
        );
    }

    #[test]
    fn test_upvote_and_unknown() {
        let n = Notification::from_update(&update("ISSUE_UPVOTED", json!({"_id": "1", "upvotes": 4})));
        assert_eq!(n.description, "An issue has been upvoted!");

        let n = Notification::from_update(&update("SOMETHING_ELSE", json!(null)));
        assert_eq!(n.title, "Update Received");
        assert_eq!(n.description, "Data has been updated.");
    }
}
