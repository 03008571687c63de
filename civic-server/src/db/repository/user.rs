//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{Location, Role, User};
use shared::util::{millis_to_datetime, new_id, now_millis};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, name, email, phone, password_hash, role, longitude, latitude, address, created_at, updated_at FROM users";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub fn into_user(self) -> User {
        let location = match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some(Location::new(lng, lat, self.address.unwrap_or_default())),
            _ => None,
        };
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role: self.role.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unknown role in users table, treating as citizen");
                Role::Citizen
            }),
            location,
            created_at: millis_to_datetime(self.created_at),
            updated_at: millis_to_datetime(self.updated_at),
        }
    }
}

/// Insert payload; `email` must already be normalized
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub location: Option<Location>,
}

pub async fn create(pool: &SqlitePool, data: NewUser) -> RepoResult<User> {
    let id = new_id();
    let now = now_millis();
    let (longitude, latitude, address) = match &data.location {
        Some(loc) => (Some(loc.longitude()), Some(loc.latitude()), Some(loc.address.clone())),
        None => (None, None, None),
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, phone, password_hash, role, longitude, latitude, address, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.password_hash)
    .bind(data.role.as_str())
    .bind(longitude)
    .bind(latitude)
    .bind(address)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("User {}", data.email)),
        other => other,
    })?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(UserRow::into_user))
}

/// Row including the password hash, for login
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Priya".into(),
            email: email.into(),
            phone: Some("9999999999".into()),
            password_hash: "$argon2id$fake".into(),
            role,
            location: Some(Location::new(77.59, 12.97, "Indiranagar")),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        let user = create(&db.pool, new_user("priya@example.com", Role::GovernmentOfficer))
            .await
            .unwrap();
        assert_eq!(user.role, Role::GovernmentOfficer);
        assert_eq!(user.location.as_ref().unwrap().address, "Indiranagar");

        let found = find_by_id(&db.pool, &user.id).await.unwrap().unwrap();
        assert_eq!(found, user);

        let row = find_by_email(&db.pool, "priya@example.com").await.unwrap().unwrap();
        assert_eq!(row.password_hash, "$argon2id$fake");
        assert!(email_exists(&db.pool, "priya@example.com").await.unwrap());
        assert!(!email_exists(&db.pool, "nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        create(&db.pool, new_user("dup@example.com", Role::Citizen))
            .await
            .unwrap();
        let err = create(&db.pool, new_user("dup@example.com", Role::Citizen))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_user_without_location() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        let mut data = new_user("noloc@example.com", Role::Citizen);
        data.location = None;
        let user = create(&db.pool, data).await.unwrap();
        assert!(user.location.is_none());
    }
}
