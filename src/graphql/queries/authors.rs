use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// Number of authors in the library
    async fn author_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let store = ctx.data_unchecked::<SharedStore>();
        let count = store.author_count().await.map_err(internal_error)?;
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    async fn all_authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let records = store.list_authors().await.map_err(internal_error)?;
        Ok(records.into_iter().map(Author::from).collect())
    }
}
