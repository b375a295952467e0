//! GraphQL object types

use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, ID, Result, SimpleObject};

use crate::store::{AuthorRecord, BookRecord, UserRecord};

use super::helpers::internal_error;
use super::loaders::AuthorLoader;

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Book {
    pub title: String,
    pub published: i32,
    pub id: ID,
    pub genres: Vec<String>,
    #[graphql(skip)]
    pub author_id: String,
}

#[ComplexObject]
impl Book {
    /// The book's author, batched per request
    async fn author(&self, ctx: &Context<'_>) -> Result<Author> {
        let loader = ctx.data_unchecked::<DataLoader<AuthorLoader>>();
        loader
            .load_one(self.author_id.clone())
            .await
            .map_err(|e| internal_error(e.as_ref()))?
            .ok_or_else(|| {
                tracing::error!(book_id = %self.id.as_str(), author_id = %self.author_id, "Book references missing author");
                internal_error(format!("author {} not found", self.author_id))
            })
    }
}

impl From<BookRecord> for Book {
    fn from(r: BookRecord) -> Self {
        Self {
            title: r.title,
            published: r.published,
            id: ID(r.id),
            genres: r.genres,
            author_id: r.author_id,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Author {
    pub name: String,
    pub id: ID,
    pub born: Option<i32>,
    /// Number of books by this author
    pub book_count: Option<i32>,
}

impl From<AuthorRecord> for Author {
    fn from(r: AuthorRecord) -> Self {
        Self {
            name: r.name,
            id: ID(r.id),
            born: r.born,
            book_count: Some(r.book_count),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub username: String,
    pub favorite_genre: String,
    pub id: ID,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            username: r.username,
            favorite_genre: r.favorite_genre,
            id: ID(r.id),
        }
    }
}

/// Signed session token returned by `login`
#[derive(Debug, Clone, SimpleObject)]
pub struct Token {
    pub value: String,
}
