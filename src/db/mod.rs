//! Database connection and operations
//!
//! SQLite backend for the [`LibraryStore`]. Each table has a small
//! repository; [`Database`] hands them out and implements the store trait by
//! delegating to them.

pub mod authors;
pub mod books;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::warn;

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use users::UsersRepository;

use crate::store::{
    AuthorRecord, BookFilter, BookRecord, CreateAuthor, CreateUser, LibraryStore, NewBook,
    StoreError, StoreResult, UserRecord,
};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool. The database file is created
    /// if it does not exist.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Connect, retrying every couple of seconds until `timeout` has passed
    pub async fn connect_with_retry(url: &str, max_connections: u32, timeout: Duration) -> Result<Self> {
        let started = Instant::now();
        loop {
            match Self::connect(url, max_connections).await {
                Ok(db) => return Ok(db),
                Err(e) if started.elapsed() + RETRY_INTERVAL < timeout => {
                    warn!(
                        error = %e,
                        retry_in_secs = RETRY_INTERVAL.as_secs(),
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(e) => return Err(e).context("Database connection timed out"),
            }
        }
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Every SQLite connection to `:memory:` is its own database, so the pool
    /// is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get an authors repository
    pub fn authors(&self) -> AuthorsRepository {
        AuthorsRepository::new(self.pool.clone())
    }

    /// Get a books repository
    pub fn books(&self) -> BooksRepository {
        BooksRepository::new(self.pool.clone())
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LibraryStore for Database {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn book_count(&self) -> StoreResult<i64> {
        self.books().count().await
    }

    async fn author_count(&self) -> StoreResult<i64> {
        self.authors().count().await
    }

    async fn list_books(&self, filter: &BookFilter) -> StoreResult<Vec<BookRecord>> {
        self.books().list(filter).await
    }

    async fn list_authors(&self) -> StoreResult<Vec<AuthorRecord>> {
        self.authors().list_all().await
    }

    async fn get_authors_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AuthorRecord>> {
        self.authors().get_by_ids(ids).await
    }

    async fn find_author_by_name(&self, name: &str) -> StoreResult<Option<AuthorRecord>> {
        self.authors().get_by_name(name).await
    }

    async fn create_author(&self, input: CreateAuthor) -> StoreResult<AuthorRecord> {
        self.authors().create(input).await
    }

    async fn upsert_author_for_book(&self, name: &str) -> StoreResult<AuthorRecord> {
        self.authors().upsert_for_book(name).await
    }

    async fn release_author_book(&self, author_id: &str) -> StoreResult<()> {
        if self.authors().decrement_book_count(author_id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn set_author_born(&self, name: &str, born: i32) -> StoreResult<Option<AuthorRecord>> {
        self.authors().set_born(name, born).await
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<BookRecord> {
        self.books().create(book).await
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<UserRecord> {
        self.users().create(input).await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        self.users().get_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.users().get_by_username(username).await
    }
}
