//! Comment Repository

use std::collections::HashMap;

use super::RepoResult;
use shared::models::{Comment, UserRef};
use shared::util::{millis_to_datetime, new_id, now_millis};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: String,
    issue_id: String,
    user_id: String,
    user_name: String,
    text: String,
    created_at: i64,
}

impl CommentRow {
    fn into_comment(self) -> (String, Comment) {
        (
            self.issue_id,
            Comment {
                id: self.id,
                user: UserRef {
                    id: self.user_id,
                    name: self.user_name,
                },
                text: self.text,
                created_at: millis_to_datetime(self.created_at),
            },
        )
    }
}

/// Append a comment; the caller checks the issue exists
pub async fn add(
    pool: &SqlitePool,
    issue_id: &str,
    author: &UserRef,
    text: &str,
) -> RepoResult<Comment> {
    let id = new_id();
    let now = now_millis();
    sqlx::query("INSERT INTO comments (id, issue_id, user_id, text, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(issue_id)
        .bind(&author.id)
        .bind(text)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(Comment {
        id,
        user: author.clone(),
        text: text.to_string(),
        created_at: millis_to_datetime(now),
    })
}

/// Comments of each listed issue, oldest first
pub async fn for_issues(
    pool: &SqlitePool,
    issue_ids: &[String],
) -> RepoResult<HashMap<String, Vec<Comment>>> {
    let mut grouped: HashMap<String, Vec<Comment>> = HashMap::new();
    if issue_ids.is_empty() {
        return Ok(grouped);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT c.id, c.issue_id, c.user_id, u.name AS user_name, c.text, c.created_at \
         FROM comments c JOIN users u ON u.id = c.user_id WHERE c.issue_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in issue_ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(") ORDER BY c.created_at ASC, c.rowid ASC");

    let rows = qb.build_query_as::<CommentRow>().fetch_all(pool).await?;
    for row in rows {
        let (issue_id, comment) = row.into_comment();
        grouped.entry(issue_id).or_default().push(comment);
    }
    Ok(grouped)
}
