use async_graphql::Value;

use super::prelude::*;
use crate::store::add_book;

#[derive(Default)]
pub struct BookMutations;

#[Object]
impl BookMutations {
    /// Add a book, creating its author on first use
    #[graphql(guard = "MutationGuard")]
    async fn add_book(
        &self,
        ctx: &Context<'_>,
        title: String,
        published: i32,
        name: String,
        genres: Vec<String>,
    ) -> Result<Option<Book>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let input = CreateBook {
            title: title.clone(),
            published,
            author_name: name.clone(),
            genres: genres.clone(),
        };

        let (book, author) = add_book(store.as_ref(), input).await.map_err(|e| {
            let invalid_args = match e.field() {
                Some("name") => Value::from(name),
                Some("genres") => Value::List(genres.into_iter().map(Value::from).collect()),
                _ => Value::from(title),
            };
            user_input_error("Saving book failed", invalid_args, e)
        })?;

        tracing::info!(book_id = %book.id, author_id = %author.id, "Book added");
        ctx.data_unchecked::<LibraryEvents>()
            .publish(LibraryEvent::BookAdded(book.clone()));

        Ok(Some(Book::from(book)))
    }
}
