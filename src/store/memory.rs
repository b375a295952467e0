//! In-process store backed by plain vectors
//!
//! Used for local development (`STORE_BACKEND=memory`) and by the test suite.
//! A single [`RwLock`] guards all three collections, which makes every write
//! (including the author upsert) atomic with respect to other requests.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    AuthorRecord, BookFilter, BookRecord, CreateAuthor, CreateUser, LibraryStore, NewBook,
    StoreError, StoreResult, UserRecord,
};

#[derive(Debug, Default)]
struct MemoryState {
    authors: Vec<AuthorRecord>,
    books: Vec<BookRecord>,
    users: Vec<UserRecord>,
}

impl MemoryState {
    fn author_name(&self, id: &str) -> Option<&str> {
        self.authors
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl LibraryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn book_count(&self) -> StoreResult<i64> {
        Ok(self.state.read().books.len() as i64)
    }

    async fn author_count(&self) -> StoreResult<i64> {
        Ok(self.state.read().authors.len() as i64)
    }

    async fn list_books(&self, filter: &BookFilter) -> StoreResult<Vec<BookRecord>> {
        let state = self.state.read();
        if filter.is_empty() {
            return Ok(state.books.clone());
        }
        Ok(state
            .books
            .iter()
            .filter(|book| {
                let author_name = state.author_name(&book.author_id).unwrap_or_default();
                filter.matches(book, author_name)
            })
            .cloned()
            .collect())
    }

    async fn list_authors(&self) -> StoreResult<Vec<AuthorRecord>> {
        Ok(self.state.read().authors.clone())
    }

    async fn get_authors_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AuthorRecord>> {
        let state = self.state.read();
        Ok(state
            .authors
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn find_author_by_name(&self, name: &str) -> StoreResult<Option<AuthorRecord>> {
        Ok(self
            .state
            .read()
            .authors
            .iter()
            .find(|a| a.name == name)
            .cloned())
    }

    async fn create_author(&self, input: CreateAuthor) -> StoreResult<AuthorRecord> {
        let mut state = self.state.write();
        if state.authors.iter().any(|a| a.name == input.name) {
            return Err(StoreError::Duplicate {
                field: "name",
                value: input.name,
            });
        }
        let author = AuthorRecord {
            id: new_id(),
            name: input.name,
            born: input.born,
            book_count: 0,
        };
        state.authors.push(author.clone());
        Ok(author)
    }

    async fn upsert_author_for_book(&self, name: &str) -> StoreResult<AuthorRecord> {
        let mut state = self.state.write();
        if let Some(author) = state.authors.iter_mut().find(|a| a.name == name) {
            author.book_count += 1;
            return Ok(author.clone());
        }
        let author = AuthorRecord {
            id: new_id(),
            name: name.to_string(),
            born: None,
            book_count: 1,
        };
        state.authors.push(author.clone());
        Ok(author)
    }

    async fn release_author_book(&self, author_id: &str) -> StoreResult<()> {
        let mut state = self.state.write();
        let author = state
            .authors
            .iter_mut()
            .find(|a| a.id == author_id)
            .ok_or(StoreError::NotFound)?;
        author.book_count = (author.book_count - 1).max(0);
        Ok(())
    }

    async fn set_author_born(&self, name: &str, born: i32) -> StoreResult<Option<AuthorRecord>> {
        let mut state = self.state.write();
        Ok(state
            .authors
            .iter_mut()
            .find(|a| a.name == name)
            .map(|author| {
                author.born = Some(born);
                author.clone()
            }))
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<BookRecord> {
        let mut state = self.state.write();
        if state.books.iter().any(|b| b.title == book.title) {
            return Err(StoreError::Duplicate {
                field: "title",
                value: book.title,
            });
        }
        if state.author_name(&book.author_id).is_none() {
            return Err(StoreError::NotFound);
        }
        let record = BookRecord {
            id: new_id(),
            title: book.title,
            published: book.published,
            author_id: book.author_id,
            genres: book.genres,
        };
        state.books.push(record.clone());
        Ok(record)
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<UserRecord> {
        let mut state = self.state.write();
        if state.users.iter().any(|u| u.username == input.username) {
            return Err(StoreError::Duplicate {
                field: "username",
                value: input.username,
            });
        }
        let user = UserRecord {
            id: new_id(),
            username: input.username,
            favorite_genre: input.favorite_genre,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.state.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .state
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::{CreateBook, add_author, add_book, seed_sample_data};

    fn create_book(title: &str, name: &str, genres: &[&str]) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            published: 2020,
            author_name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn titles(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_book_creates_author_once() {
        let store = MemoryStore::new();

        let (book, author) = add_book(&store, create_book("Title One", "Unseen Author", &["x"]))
            .await
            .unwrap();
        assert_eq!(author.name, "Unseen Author");
        assert_eq!(author.book_count, 1);
        assert_eq!(book.author_id, author.id);

        let (_, again) = add_book(&store, create_book("Title Two", "Unseen Author", &["y"]))
            .await
            .unwrap();
        assert_eq!(again.id, author.id);
        assert_eq!(again.book_count, 2);
        assert_eq!(store.author_count().await.unwrap(), 1);
        assert_eq!(store.book_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_title_releases_author_count() {
        let store = MemoryStore::new();
        add_book(&store, create_book("Clean Code", "Robert Martin", &[]))
            .await
            .unwrap();

        let err = add_book(&store, create_book("Clean Code", "Someone Else", &[]))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Duplicate { field: "title", .. });

        // The author was persisted before the book insert failed
        let someone = store.find_author_by_name("Someone Else").await.unwrap().unwrap();
        assert_eq!(someone.book_count, 0);
        assert_eq!(store.book_count().await.unwrap(), 1);

        let robert = store.find_author_by_name("Robert Martin").await.unwrap().unwrap();
        assert_eq!(robert.book_count, 1);
    }

    #[tokio::test]
    async fn test_add_author_duplicate() {
        let store = MemoryStore::new();
        add_author(
            &store,
            CreateAuthor {
                name: "Sandi Metz".to_string(),
                born: None,
            },
        )
        .await
        .unwrap();
        let err = add_author(
            &store,
            CreateAuthor {
                name: "Sandi Metz".to_string(),
                born: Some(1960),
            },
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::Duplicate { field: "name", .. });
    }

    #[tokio::test]
    async fn test_set_author_born_unknown_is_none() {
        let store = MemoryStore::new();
        let result = store.set_author_born("Nonexistent", 2000).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.author_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_books_filters() {
        let store = MemoryStore::new();
        seed_sample_data(&store).await.unwrap();

        let all = store.list_books(&BookFilter::default()).await.unwrap();
        assert_eq!(all.len(), 7);

        let by_author = store
            .list_books(&BookFilter {
                author: Some("Robert Martin".to_string()),
                genre: None,
            })
            .await
            .unwrap();
        assert_eq!(
            titles(&by_author),
            vec!["Clean Code", "Agile software development"]
        );

        let by_genre = store
            .list_books(&BookFilter {
                author: None,
                genre: Some("refactoring".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(by_genre.len(), 4);

        let both = store
            .list_books(&BookFilter {
                author: Some("Robert Martin".to_string()),
                genre: Some("refactoring".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(titles(&both), vec!["Clean Code"]);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_create_single_author() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = vec![];
        for i in 0..10 {
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                add_book(
                    s.as_ref(),
                    create_book(&format!("Concurrent Book {}", i), "Racing Author", &[]),
                )
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let authors = store.list_authors().await.unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].book_count, 10);
    }
}
