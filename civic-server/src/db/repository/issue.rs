//! Issue Repository

use super::{RepoError, RepoResult, comment};
use shared::geo::BoundingBox;
use shared::models::{Issue, IssueStatus, Location, Priority, UserRef};
use shared::util::{millis_to_datetime, new_id, now_millis};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const ISSUE_SELECT: &str = "SELECT i.id, i.text, i.image_link, i.longitude, i.latitude, i.address, i.category, i.status, i.region, i.priority, i.upvotes, i.reported_by, u.name AS reporter_name, i.created_at, i.updated_at FROM issues i JOIN users u ON u.id = i.reported_by";

#[derive(Debug, Clone, sqlx::FromRow)]
struct IssueRow {
    id: String,
    text: String,
    image_link: Option<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    category: String,
    status: String,
    region: String,
    priority: String,
    upvotes: i64,
    reported_by: String,
    reporter_name: String,
    created_at: i64,
    updated_at: i64,
}

impl IssueRow {
    fn into_issue(self) -> Issue {
        let status = self.status.parse().unwrap_or_else(|e| {
            tracing::warn!(issue_id = %self.id, error = %e, "Unknown status in issues table");
            IssueStatus::Open
        });
        Issue {
            status,
            text: self.text,
            image_link: self.image_link,
            location: Location::new(self.longitude, self.latitude, self.address),
            category: self.category,
            region: self.region,
            priority: self.priority.parse().unwrap_or_default(),
            upvotes: u32::try_from(self.upvotes).unwrap_or(0),
            reported_by: UserRef {
                id: self.reported_by,
                name: self.reporter_name,
            },
            created_at: millis_to_datetime(self.created_at),
            updated_at: millis_to_datetime(self.updated_at),
            comments: Vec::new(),
            id: self.id,
        }
    }
}

/// Insert payload, already validated and normalized
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub text: String,
    pub image_link: Option<String>,
    pub location: Location,
    pub category: String,
    pub region: String,
    pub priority: Priority,
    pub reported_by: String,
}

/// Filters for the paged list
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub priority: Option<Priority>,
    pub reported_by: Option<String>,
}

impl IssueFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(status) = self.status {
            qb.push(" AND i.status = ").push_bind(status.as_str());
        }
        if let Some(category) = &self.category {
            qb.push(" AND i.category = ").push_bind(category.clone());
        }
        if let Some(region) = &self.region {
            qb.push(" AND i.region = ").push_bind(region.clone());
        }
        if let Some(priority) = self.priority {
            qb.push(" AND i.priority = ").push_bind(priority.as_str());
        }
        if let Some(reported_by) = &self.reported_by {
            qb.push(" AND i.reported_by = ").push_bind(reported_by.clone());
        }
    }
}

pub async fn create(pool: &SqlitePool, data: NewIssue) -> RepoResult<Issue> {
    let id = new_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO issues (id, text, image_link, longitude, latitude, address, category, status, region, priority, upvotes, reported_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 'open', ?, ?, 0, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&data.text)
    .bind(&data.image_link)
    .bind(data.location.longitude())
    .bind(data.location.latitude())
    .bind(&data.location.address)
    .bind(&data.category)
    .bind(&data.region)
    .bind(data.priority.as_str())
    .bind(&data.reported_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create issue".into()))
}

/// Single issue with its comments
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Issue>> {
    let row = sqlx::query_as::<_, IssueRow>(&format!("{ISSUE_SELECT} WHERE i.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut issues = with_comments(pool, vec![row.into_issue()]).await?;
    Ok(issues.pop())
}

/// One page of issues, newest first, plus the total matching count
pub async fn list(
    pool: &SqlitePool,
    filter: &IssueFilter,
    limit: u32,
    offset: u64,
) -> RepoResult<(Vec<Issue>, u64)> {
    let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM issues i");
    filter.push_where(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ISSUE_SELECT);
    filter.push_where(&mut qb);
    qb.push(" ORDER BY i.created_at DESC, i.rowid DESC LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

    let rows = qb.build_query_as::<IssueRow>().fetch_all(pool).await?;
    let issues = with_comments(pool, rows.into_iter().map(IssueRow::into_issue).collect()).await?;
    Ok((issues, u64::try_from(total).unwrap_or(0)))
}

/// Every issue matching `filter`, newest first
pub async fn list_all(pool: &SqlitePool, filter: &IssueFilter) -> RepoResult<Vec<Issue>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ISSUE_SELECT);
    filter.push_where(&mut qb);
    qb.push(" ORDER BY i.created_at DESC, i.rowid DESC");

    let rows = qb.build_query_as::<IssueRow>().fetch_all(pool).await?;
    with_comments(pool, rows.into_iter().map(IssueRow::into_issue).collect()).await
}

/// Candidates inside a lat/lng window; exact distance is checked by the caller
pub async fn find_in_box(pool: &SqlitePool, bbox: &BoundingBox) -> RepoResult<Vec<Issue>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ISSUE_SELECT);
    qb.push(" WHERE i.latitude BETWEEN ")
        .push_bind(bbox.min_lat)
        .push(" AND ")
        .push_bind(bbox.max_lat);

    // Windows crossing the antimeridian are filtered in memory
    if !bbox.wraps() {
        qb.push(" AND i.longitude BETWEEN ")
            .push_bind(bbox.min_lng)
            .push(" AND ")
            .push_bind(bbox.max_lng);
    }

    let rows = qb.build_query_as::<IssueRow>().fetch_all(pool).await?;
    let issues = rows
        .into_iter()
        .map(IssueRow::into_issue)
        .filter(|issue| bbox.contains(issue.location.coordinates()))
        .collect();
    with_comments(pool, issues).await
}

/// Current status, or `None` when the issue does not exist
pub async fn status_of(pool: &SqlitePool, id: &str) -> RepoResult<Option<IssueStatus>> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM issues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    status
        .map(|s| s.parse().map_err(RepoError::Validation))
        .transpose()
}

/// Move `id` from `from` to `to`; returns false if the status changed underneath
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    from: IssueStatus,
    to: IssueStatus,
) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE issues SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(to.as_str())
        .bind(now_millis())
        .bind(id)
        .bind(from.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn touch(pool: &SqlitePool, id: &str) -> RepoResult<()> {
    sqlx::query("UPDATE issues SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn with_comments(pool: &SqlitePool, mut issues: Vec<Issue>) -> RepoResult<Vec<Issue>> {
    let ids: Vec<String> = issues.iter().map(|i| i.id.clone()).collect();
    let mut grouped = comment::for_issues(pool, &ids).await?;
    for issue in &mut issues {
        if let Some(comments) = grouped.remove(&issue.id) {
            issue.comments = comments;
        }
    }
    Ok(issues)
}
