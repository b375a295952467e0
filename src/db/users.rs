//! Users repository

use sqlx::SqlitePool;

use super::sqlite_helpers::{map_unique_violation, new_id, now_iso8601};
use crate::store::{CreateUser, StoreResult, UserRecord};

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> StoreResult<UserRecord> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, favorite_genre, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.favorite_genre)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username", &user.username))?;

        Ok(UserRecord {
            id,
            username: user.username,
            favorite_genre: user.favorite_genre,
        })
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id, username, favorite_genre FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserRecord {
            id: r.0,
            username: r.1,
            favorite_genre: r.2,
        }))
    }

    /// Get user by exact username
    pub async fn get_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id, username, favorite_genre FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserRecord {
            id: r.0,
            username: r.1,
            favorite_genre: r.2,
        }))
    }
}
