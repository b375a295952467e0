//! Sample library used for development and demos.
//!
//! Seeding goes through the public store operations, so author book counts
//! come out of the same find-or-create path that `addBook` uses. Skipped
//! entirely when the store already holds authors or books.

use tracing::{debug, info};

use super::{CreateAuthor, CreateBook, LibraryStore, StoreResult, add_book};

/// Result of running the sample seed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub authors_created: usize,
    pub books_created: usize,
    pub skipped: bool,
}

struct SampleAuthor {
    name: &'static str,
    born: Option<i32>,
}

struct SampleBook {
    title: &'static str,
    published: i32,
    author: &'static str,
    genres: &'static [&'static str],
}

const AUTHORS: &[SampleAuthor] = &[
    SampleAuthor {
        name: "Robert Martin",
        born: Some(1952),
    },
    SampleAuthor {
        name: "Martin Fowler",
        born: Some(1963),
    },
    SampleAuthor {
        name: "Fyodor Dostoevsky",
        born: Some(1821),
    },
    SampleAuthor {
        name: "Joshua Kerievsky",
        born: None,
    },
    SampleAuthor {
        name: "Sandi Metz",
        born: None,
    },
];

const BOOKS: &[SampleBook] = &[
    SampleBook {
        title: "Clean Code",
        published: 2008,
        author: "Robert Martin",
        genres: &["refactoring"],
    },
    SampleBook {
        title: "Agile software development",
        published: 2002,
        author: "Robert Martin",
        genres: &["agile", "patterns", "design"],
    },
    SampleBook {
        title: "Refactoring, edition 2",
        published: 2018,
        author: "Martin Fowler",
        genres: &["refactoring"],
    },
    SampleBook {
        title: "Refactoring to patterns",
        published: 2008,
        author: "Joshua Kerievsky",
        genres: &["refactoring", "patterns"],
    },
    SampleBook {
        title: "Practical Object-Oriented Design, An Agile Primer Using Ruby",
        published: 2012,
        author: "Sandi Metz",
        genres: &["refactoring", "design"],
    },
    SampleBook {
        title: "Crime and punishment",
        published: 1866,
        author: "Fyodor Dostoevsky",
        genres: &["classic", "crime"],
    },
    SampleBook {
        title: "Demons",
        published: 1872,
        author: "Fyodor Dostoevsky",
        genres: &["classic", "revolution"],
    },
];

/// Insert the sample authors and books into an empty store.
pub async fn seed_sample_data(store: &dyn LibraryStore) -> StoreResult<SeedResult> {
    if store.author_count().await? > 0 || store.book_count().await? > 0 {
        debug!(backend = store.backend(), "Store not empty, skipping sample seed");
        return Ok(SeedResult {
            skipped: true,
            ..Default::default()
        });
    }

    let mut result = SeedResult::default();

    for author in AUTHORS {
        store
            .create_author(CreateAuthor {
                name: author.name.to_string(),
                born: author.born,
            })
            .await?;
        result.authors_created += 1;
    }

    for book in BOOKS {
        add_book(
            store,
            CreateBook {
                title: book.title.to_string(),
                published: book.published,
                author_name: book.author.to_string(),
                genres: book.genres.iter().map(|g| g.to_string()).collect(),
            },
        )
        .await?;
        result.books_created += 1;
    }

    info!(
        backend = store.backend(),
        authors = result.authors_created,
        books = result.books_created,
        "Sample library seeded"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_seed_counts_books_per_author() {
        let store = MemoryStore::new();
        let result = seed_sample_data(&store).await.unwrap();
        assert_eq!(result.authors_created, 5);
        assert_eq!(result.books_created, 7);

        let dostoevsky = store
            .find_author_by_name("Fyodor Dostoevsky")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dostoevsky.book_count, 2);
        assert_eq!(dostoevsky.born, Some(1821));
    }

    #[tokio::test]
    async fn test_seed_is_skipped_when_not_empty() {
        let store = MemoryStore::new();
        seed_sample_data(&store).await.unwrap();
        let second = seed_sample_data(&store).await.unwrap();
        assert!(second.skipped);
        assert_eq!(store.book_count().await.unwrap(), 7);
    }
}
