//! API response envelope
//!
//! Every endpoint answers with the same shape:
//! ```json
//! {
//!     "success": true,
//!     "message": "Issues fetched",
//!     "data": [ ... ],
//!     "pagination": { "total": 42, "page": 1, "limit": 10, "totalPages": 5 },
//!     "count": 10
//! }
//! ```
//! Failures set `success: false` and carry a numeric `code`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, ErrorCode};
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    /// Error code (0 for success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Number of items in `data` for list responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: Some(0),
            message: None,
            data: Some(data),
            pagination: None,
            count: None,
            details: None,
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// The error code carried by a failed envelope
    pub fn error_code(&self) -> ErrorCode {
        self.code
            .and_then(|c| ErrorCode::try_from(c).ok())
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Split the envelope into its payload or the error it describes
    pub fn into_result(self) -> Result<Option<T>, AppError> {
        if self.success {
            return Ok(self.data);
        }
        let code = self.error_code();
        let message = self
            .message
            .unwrap_or_else(|| code.message().to_string());
        Err(AppError {
            code,
            message,
            details: self.details,
        })
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List response carrying `count` and optional pagination
    pub fn list(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        let count = items.len() as u64;
        Self {
            pagination,
            ..Self::success(items).with_count(count)
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            code: Some(err.code.code()),
            message: Some(err.message.clone()),
            data: None,
            pagination: None,
            count: None,
            details: err.details.clone(),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    /// Current page (1-based)
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Row offset for this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// `data` of signup, login and me
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = if self.success {
            http::StatusCode::OK
        } else {
            self.error_code().http_status()
        };

        (status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_total_pages() {
        let p = Pagination::new(1, 10, 42);
        assert_eq!(p.total_pages, 5);
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(3, 10, 30);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset(), 20);

        let p = Pagination::new(1, 0, 5);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(2, 5, 11)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"total": 11, "page": 2, "limit": 5, "totalPages": 3})
        );
    }

    #[test]
    fn test_list_response_sets_count() {
        let resp = ApiResponse::list(vec![1, 2, 3], Some(Pagination::new(1, 10, 3)));
        assert!(resp.success);
        assert_eq!(resp.count, Some(3));
        assert_eq!(resp.pagination.unwrap().total, 3);
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::new(ErrorCode::IssueNotFound);
        let resp = ApiResponse::<()>::error(&err);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 3001);
        assert_eq!(json["message"], "Issue not found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_into_result() {
        let ok: ApiResponse<u32> = serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(7));

        let failed: ApiResponse<u32> =
            serde_json::from_str(r#"{"success":false,"code":1002,"message":"nope"}"#).unwrap();
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert_eq!(err.message, "nope");
    }

    #[derive(Debug, Deserialize)]
    struct Receipt {
        id: String,
    }

    #[test]
    fn test_failure_envelope_for_payload_without_default() {
        let failed: ApiResponse<Receipt> = serde_json::from_str(
            r#"{"success":false,"code":3001,"message":"Issue not found"}"#,
        )
        .unwrap();
        assert!(failed.data.is_none());
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::IssueNotFound);

        let ok: ApiResponse<Receipt> =
            serde_json::from_str(r#"{"success":true,"data":{"id":"r1"}}"#).unwrap();
        assert_eq!(ok.into_result().unwrap().unwrap().id, "r1");
    }

    #[test]
    fn test_into_result_without_code() {
        let failed: ApiResponse<u32> =
            serde_json::from_str(r#"{"success":false,"message":"Server said no"}"#).unwrap();
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(err.message, "Server said no");
    }
}
