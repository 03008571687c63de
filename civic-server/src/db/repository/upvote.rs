//! Upvote Repository
//!
//! One upvote per (issue, user). The counter on `issues` is kept in the same
//! transaction as the `upvotes` row.

use super::{RepoError, RepoResult};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Record an upvote and return the new count
///
/// `Duplicate` when the user already upvoted, `NotFound` when the issue is
/// missing.
pub async fn add(pool: &SqlitePool, issue_id: &str, user_id: &str) -> RepoResult<u32> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM issues WHERE id = ?")
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("Issue {issue_id}")));
    }

    sqlx::query("INSERT INTO upvotes (issue_id, user_id, created_at) VALUES (?, ?, ?)")
        .bind(issue_id)
        .bind(user_id)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

    let upvotes: i64 = sqlx::query_scalar(
        "UPDATE issues SET upvotes = upvotes + 1 WHERE id = ? RETURNING upvotes",
    )
    .bind(issue_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(u32::try_from(upvotes).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::issue::{self, NewIssue};
    use crate::db::repository::user::{self, NewUser};
    use shared::models::{Location, Priority, Role};

    async fn seed(db: &DbService, email: &str) -> String {
        user::create(
            &db.pool,
            NewUser {
                name: email.into(),
                email: email.into(),
                phone: None,
                password_hash: "x".into(),
                role: Role::Citizen,
                location: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_one_upvote_per_user() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        let alice = seed(&db, "alice@example.com").await;
        let bob = seed(&db, "bob@example.com").await;
        let created = issue::create(
            &db.pool,
            NewIssue {
                text: "Broken light".into(),
                image_link: None,
                location: Location::new(77.0, 12.0, ""),
                category: "street light".into(),
                region: "general".into(),
                priority: Priority::Low,
                reported_by: alice.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(add(&db.pool, &created.id, &alice).await.unwrap(), 1);
        assert_eq!(add(&db.pool, &created.id, &bob).await.unwrap(), 2);
        assert!(matches!(
            add(&db.pool, &created.id, &alice).await,
            Err(RepoError::Duplicate(_))
        ));

        // the failed attempt rolled back
        let issue = issue::find_by_id(&db.pool, &created.id).await.unwrap().unwrap();
        assert_eq!(issue.upvotes, 2);
    }

    #[tokio::test]
    async fn test_missing_issue() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        let alice = seed(&db, "alice@example.com").await;
        assert!(matches!(
            add(&db.pool, "nope", &alice).await,
            Err(RepoError::NotFound(_))
        ));
    }
}
