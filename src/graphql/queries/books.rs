use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Number of books in the library
    async fn book_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let store = ctx.data_unchecked::<SharedStore>();
        let count = store.book_count().await.map_err(internal_error)?;
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// All books, optionally narrowed to an author's name and/or a genre
    async fn all_books(
        &self,
        ctx: &Context<'_>,
        author: Option<String>,
        genre: Option<String>,
    ) -> Result<Vec<Book>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let filter = BookFilter { author, genre };
        let records = store.list_books(&filter).await.map_err(internal_error)?;
        Ok(records.into_iter().map(Book::from).collect())
    }
}
