//! User Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Location;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Citizen,
    #[serde(alias = "officer")]
    GovernmentOfficer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::GovernmentOfficer => "government_officer",
            Role::Admin => "admin",
        }
    }

    /// Officers and admins may triage issues
    pub fn is_officer(&self) -> bool {
        matches!(self, Role::GovernmentOfficer | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Role::Citizen),
            "government_officer" | "officer" => Ok(Role::GovernmentOfficer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Public user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author of a comment or reporter of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde() {
        assert_eq!(
            serde_json::to_string(&Role::GovernmentOfficer).unwrap(),
            "\"government_officer\""
        );
        let role: Role = serde_json::from_str("\"officer\"").unwrap();
        assert_eq!(role, Role::GovernmentOfficer);
        let role: Role = serde_json::from_str("\"citizen\"").unwrap();
        assert_eq!(role, Role::Citizen);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("officer".parse::<Role>(), Ok(Role::GovernmentOfficer));
        assert!("mayor".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_officer() {
        assert!(!Role::Citizen.is_officer());
        assert!(Role::GovernmentOfficer.is_officer());
        assert!(Role::Admin.is_officer());
    }

    #[test]
    fn test_user_json_shape() {
        let json = r#"{
            "_id": "u1",
            "name": "Asha",
            "email": "asha@example.com",
            "role": "government_officer",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.role.is_officer());
        assert!(user.phone.is_none());

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["_id"], "u1");
        assert!(back.get("phone").is_none());
        assert!(back.get("createdAt").is_some());
    }
}
