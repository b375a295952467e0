//! Domain store for authors, books and users
//!
//! Resolvers only ever talk to a [`LibraryStore`]. Two backends implement it:
//! the SQLite-backed [`Database`](crate::db::Database) and the in-process
//! [`MemoryStore`]. Write-path rules that must behave the same on both
//! backends (validation, the author find-or-create on `addBook`) live here
//! rather than in either backend.

pub mod memory;
pub mod seed;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use memory::MemoryStore;
pub use seed::{SeedResult, seed_sample_data};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: String,
    pub name: String,
    pub born: Option<i32>,
    /// Number of books referencing this author. Maintained on write.
    pub book_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub published: i32,
    pub author_id: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub favorite_genre: String,
}

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub published: i32,
    /// Name of the author; created on first use
    pub author_name: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAuthor {
    pub name: String,
    pub born: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub favorite_genre: String,
}

/// Book insert after the author has been resolved.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub published: i32,
    pub author_id: String,
    pub genres: Vec<String>,
}

/// Optional narrowing for [`LibraryStore::list_books`]. Both conditions are ANDed.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Exact author name
    pub author: Option<String>,
    /// Genre that must be present in the book's genre set
    pub genre: Option<String>,
}

impl BookFilter {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.genre.is_none()
    }

    /// Check a book against this filter. `author_name` is the name of the
    /// book's author.
    pub fn matches(&self, book: &BookRecord, author_name: &str) -> bool {
        if let Some(author) = &self.author
            && author != author_name
        {
            return false;
        }
        if let Some(genre) = &self.genre
            && !book.genres.iter().any(|g| g == genre)
        {
            return false;
        }
        true
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{field} must be unique, '{value}' already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }

    /// The input field the error is about, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            StoreError::Validation { field, .. } | StoreError::Duplicate { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Store trait
// ============================================================================

/// Shared handle passed to resolvers and services
pub type SharedStore = Arc<dyn LibraryStore>;

/// Operations every backend provides.
///
/// Implementations enforce uniqueness (author name, book title, username)
/// and must make [`upsert_author_for_book`](Self::upsert_author_for_book)
/// atomic: concurrent calls for one unseen name produce a single author.
#[async_trait]
pub trait LibraryStore: Send + Sync + 'static {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;

    async fn book_count(&self) -> StoreResult<i64>;

    async fn author_count(&self) -> StoreResult<i64>;

    /// Books in insertion order, narrowed by `filter`
    async fn list_books(&self, filter: &BookFilter) -> StoreResult<Vec<BookRecord>>;

    /// Authors in insertion order
    async fn list_authors(&self) -> StoreResult<Vec<AuthorRecord>>;

    async fn get_authors_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AuthorRecord>>;

    async fn find_author_by_name(&self, name: &str) -> StoreResult<Option<AuthorRecord>>;

    /// Insert a new author with a book count of zero
    async fn create_author(&self, input: CreateAuthor) -> StoreResult<AuthorRecord>;

    /// Find-or-create the author named `name` and count one more book for it.
    /// A new author starts at a count of one.
    async fn upsert_author_for_book(&self, name: &str) -> StoreResult<AuthorRecord>;

    /// Undo one [`upsert_author_for_book`](Self::upsert_author_for_book) increment
    async fn release_author_book(&self, author_id: &str) -> StoreResult<()>;

    /// Set `born` on the author named `name`. `None` when no such author exists.
    async fn set_author_born(&self, name: &str, born: i32) -> StoreResult<Option<AuthorRecord>>;

    async fn insert_book(&self, book: NewBook) -> StoreResult<BookRecord>;

    async fn create_user(&self, input: CreateUser) -> StoreResult<UserRecord>;

    async fn get_user(&self, id: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;
}

// ============================================================================
// Write paths shared by all backends
// ============================================================================

/// Add a book, creating its author on first use.
///
/// The author is upserted and persisted before the book is inserted. When
/// the book insert fails the author's counter is decremented again, so an
/// author created by a failed call stays behind with a count of zero.
pub async fn add_book(
    store: &dyn LibraryStore,
    input: CreateBook,
) -> StoreResult<(BookRecord, AuthorRecord)> {
    let input = validation::validate_book(input)?;

    let mut author = store.upsert_author_for_book(&input.author_name).await?;
    debug!(author = %author.name, book_count = author.book_count, "Author resolved for new book");

    let new_book = NewBook {
        title: input.title,
        published: input.published,
        author_id: author.id.clone(),
        genres: input.genres,
    };

    match store.insert_book(new_book).await {
        Ok(book) => Ok((book, author)),
        Err(e) => {
            if let Err(release_err) = store.release_author_book(&author.id).await {
                warn!(
                    author_id = %author.id,
                    error = %release_err,
                    "Failed to release author book count after failed insert"
                );
            } else {
                author.book_count -= 1;
            }
            Err(e)
        }
    }
}

/// Create an author after validating the input
pub async fn add_author(store: &dyn LibraryStore, input: CreateAuthor) -> StoreResult<AuthorRecord> {
    let input = validation::validate_author(input)?;
    store.create_author(input).await
}

/// Create a user after validating the input
pub async fn add_user(store: &dyn LibraryStore, input: CreateUser) -> StoreResult<UserRecord> {
    let input = validation::validate_user(input)?;
    store.create_user(input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(genres: &[&str]) -> BookRecord {
        BookRecord {
            id: "b1".to_string(),
            title: "Clean Code".to_string(),
            published: 2008,
            author_id: "a1".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = BookFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&book(&[]), "anyone"));
    }

    #[test]
    fn test_filter_by_author_and_genre() {
        let filter = BookFilter {
            author: Some("Robert Martin".to_string()),
            genre: Some("refactoring".to_string()),
        };
        assert!(filter.matches(&book(&["refactoring"]), "Robert Martin"));
        assert!(!filter.matches(&book(&["agile"]), "Robert Martin"));
        assert!(!filter.matches(&book(&["refactoring"]), "Martin Fowler"));
    }

    #[test]
    fn test_error_field() {
        let err = StoreError::Duplicate {
            field: "name",
            value: "Sandi Metz".to_string(),
        };
        assert_eq!(err.field(), Some("name"));
        assert_eq!(StoreError::NotFound.field(), None);
    }
}
