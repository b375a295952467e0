//! Books repository

use sqlx::SqlitePool;

use super::sqlite_helpers::{
    json_array_contains_sql, json_to_vec, map_unique_violation, new_id, now_iso8601, vec_to_json,
};
use crate::store::{BookFilter, BookRecord, NewBook, StoreResult};

type BookRow = (String, String, i32, String, String);

fn row_to_record(r: BookRow) -> BookRecord {
    BookRecord {
        id: r.0,
        title: r.1,
        published: r.2,
        author_id: r.3,
        genres: json_to_vec(&r.4),
    }
}

pub struct BooksRepository {
    pool: SqlitePool,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// List books in insertion order, narrowed by author name and/or genre
    pub async fn list(&self, filter: &BookFilter) -> StoreResult<Vec<BookRecord>> {
        let mut sql = String::from(
            "SELECT b.id, b.title, b.published, b.author_id, b.genres \
             FROM books b JOIN authors a ON a.id = b.author_id",
        );
        let mut conditions = Vec::new();
        if filter.author.is_some() {
            conditions.push("a.name = ?".to_string());
        }
        if filter.genre.is_some() {
            conditions.push(json_array_contains_sql("b.genres"));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY b.rowid");

        let mut query = sqlx::query_as::<_, BookRow>(&sql);
        if let Some(author) = &filter.author {
            query = query.bind(author);
        }
        if let Some(genre) = &filter.genre {
            query = query.bind(genre);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    /// Insert a book for an already-resolved author
    pub async fn create(&self, book: NewBook) -> StoreResult<BookRecord> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO books (id, title, published, author_id, genres, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&book.title)
        .bind(book.published)
        .bind(&book.author_id)
        .bind(vec_to_json(&book.genres))
        .bind(now_iso8601())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "title", &book.title))?;

        Ok(BookRecord {
            id,
            title: book.title,
            published: book.published,
            author_id: book.author_id,
            genres: book.genres,
        })
    }
}
