//! Authors repository

use sqlx::SqlitePool;

use super::sqlite_helpers::{map_unique_violation, new_id, now_iso8601, placeholders};
use crate::store::{AuthorRecord, CreateAuthor, StoreResult};

type AuthorRow = (String, String, Option<i32>, i32);

fn row_to_record(r: AuthorRow) -> AuthorRecord {
    AuthorRecord {
        id: r.0,
        name: r.1,
        born: r.2,
        book_count: r.3,
    }
}

pub struct AuthorsRepository {
    pool: SqlitePool,
}

impl AuthorsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// List all authors in insertion order
    pub async fn list_all(&self) -> StoreResult<Vec<AuthorRecord>> {
        let rows = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, name, born, book_count FROM authors ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    pub async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AuthorRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, born, book_count FROM authors WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, AuthorRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    /// Get author by exact name
    pub async fn get_by_name(&self, name: &str) -> StoreResult<Option<AuthorRecord>> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, name, born, book_count FROM authors WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_record))
    }

    /// Create an author with no books
    pub async fn create(&self, author: CreateAuthor) -> StoreResult<AuthorRecord> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO authors (id, name, born, book_count, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&author.name)
        .bind(author.born)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "name", &author.name))?;

        Ok(AuthorRecord {
            id,
            name: author.name,
            born: author.born,
            book_count: 0,
        })
    }

    /// Insert the author with a count of one, or bump the count of the
    /// existing row with that name. Single statement, so two concurrent
    /// callers can't both insert.
    pub async fn upsert_for_book(&self, name: &str) -> StoreResult<AuthorRecord> {
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            INSERT INTO authors (id, name, born, book_count, created_at)
            VALUES (?, ?, NULL, 1, ?)
            ON CONFLICT(name) DO UPDATE SET book_count = book_count + 1
            RETURNING id, name, born, book_count
            "#,
        )
        .bind(new_id())
        .bind(name)
        .bind(now_iso8601())
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_record(row))
    }

    /// Decrement the book count, never below zero. Returns whether a row matched.
    pub async fn decrement_book_count(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE authors SET book_count = MAX(book_count - 1, 0) WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update birth year by name
    pub async fn set_born(&self, name: &str, born: i32) -> StoreResult<Option<AuthorRecord>> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "UPDATE authors SET born = ? WHERE name = ? RETURNING id, name, born, book_count",
        )
        .bind(born)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_record))
    }
}
