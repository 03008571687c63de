//! Comment Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRef;

/// Append-only note on an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub user: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
