//! Issue API

use async_trait::async_trait;
use shared::Pagination;
use shared::models::{
    CommentCreate, Issue, IssueCreate, IssueQuery, IssueStatus, IssueStatusUpdate, NearbyIssue,
    NearbyQuery, UpvoteResult,
};

use crate::http::HttpClient;
use crate::{ClientError, ClientResult};

/// One page of the issue list
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub pagination: Option<Pagination>,
}

/// Proximity search, split out so the duplicate check can run against a fake
#[async_trait]
pub trait NearbySearch: Send + Sync {
    async fn nearby(&self, query: NearbyQuery) -> ClientResult<Vec<NearbyIssue>>;
}

#[derive(Debug, Clone)]
pub struct IssueApi<H> {
    http: H,
}

fn required<T>(data: Option<T>, what: &str) -> ClientResult<T> {
    data.ok_or_else(|| ClientError::InvalidResponse(format!("Missing {what} in response")))
}

/// Query pairs for the list endpoint; unset filters are left out
pub fn list_query_pairs(query: &IssueQuery) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(status) = query.status {
        pairs.push(("status", status.as_str().to_string()));
    }
    if let Some(category) = &query.category {
        pairs.push(("category", category.clone()));
    }
    if let Some(region) = &query.region {
        pairs.push(("region", region.clone()));
    }
    if let Some(priority) = query.priority {
        pairs.push(("priority", priority.as_str().to_string()));
    }
    if let Some(reported_by) = &query.reported_by {
        pairs.push(("reportedBy", reported_by.clone()));
    }
    if let Some(page) = query.page {
        pairs.push(("page", page.to_string()));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit", limit.to_string()));
    }
    pairs
}

impl<H: HttpClient> IssueApi<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    pub async fn create(&self, issue: &IssueCreate) -> ClientResult<Issue> {
        let resp = self.http.post("/api/issues/create", issue).await?;
        required(resp.data, "issue")
    }

    pub async fn list(&self, query: &IssueQuery) -> ClientResult<IssuePage> {
        let resp = self
            .http
            .get_query::<Vec<Issue>>("/api/issues", &list_query_pairs(query))
            .await?;
        Ok(IssuePage {
            pagination: resp.pagination,
            issues: resp.data.unwrap_or_default(),
        })
    }

    pub async fn my_issues(&self) -> ClientResult<Vec<Issue>> {
        let resp = self.http.get("/api/issues/my").await?;
        Ok(resp.data.unwrap_or_default())
    }

    /// Issues around the officer's station, or all of them
    pub async fn officer_dashboard(&self) -> ClientResult<Vec<Issue>> {
        let resp = self.http.get("/api/issues/officer/dashboard").await?;
        Ok(resp.data.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> ClientResult<Issue> {
        let resp = self.http.get(&format!("/api/issues/{id}")).await?;
        required(resp.data, "issue")
    }

    pub async fn update_status(&self, id: &str, status: IssueStatus) -> ClientResult<Issue> {
        let resp = self
            .http
            .patch(
                &format!("/api/issues/{id}/status"),
                &IssueStatusUpdate { status },
            )
            .await?;
        required(resp.data, "issue")
    }

    pub async fn upvote(&self, id: &str) -> ClientResult<UpvoteResult> {
        let resp = self
            .http
            .post(&format!("/api/issues/{id}/upvote"), &serde_json::json!({}))
            .await?;
        required(resp.data, "upvote result")
    }

    pub async fn comment(&self, id: &str, text: &str) -> ClientResult<Issue> {
        let body = CommentCreate {
            text: text.to_string(),
        };
        let resp = self
            .http
            .post(&format!("/api/issues/{id}/comment"), &body)
            .await?;
        required(resp.data, "issue")
    }
}

#[async_trait]
impl<H: HttpClient> NearbySearch for IssueApi<H> {
    async fn nearby(&self, query: NearbyQuery) -> ClientResult<Vec<NearbyIssue>> {
        let mut pairs = vec![
            ("longitude", query.longitude.to_string()),
            ("latitude", query.latitude.to_string()),
        ];
        if let Some(max_distance) = query.max_distance {
            pairs.push(("maxDistance", max_distance.to_string()));
        }
        let resp = self.http.get_query("/api/issues/nearby", &pairs).await?;
        Ok(resp.data.unwrap_or_default())
    }
}
