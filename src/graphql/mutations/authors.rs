use super::prelude::*;
use crate::store::add_author;

#[derive(Default)]
pub struct AuthorMutations;

#[Object]
impl AuthorMutations {
    #[graphql(guard = "MutationGuard")]
    async fn add_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        born: Option<i32>,
    ) -> Result<Option<Author>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let author = add_author(
            store.as_ref(),
            CreateAuthor {
                name: name.clone(),
                born,
            },
        )
        .await
        .map_err(|e| user_input_error("Saving author failed", name, e))?;

        tracing::info!(author_id = %author.id, "Author added");
        Ok(Some(Author::from(author)))
    }

    /// Set an author's birth year. Returns null when no author has that name.
    #[graphql(guard = "MutationGuard")]
    async fn edit_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        set_born_to: i32,
    ) -> Result<Option<Author>> {
        let store = ctx.data_unchecked::<SharedStore>();
        let updated = store
            .set_author_born(&name, set_born_to)
            .await
            .map_err(|e| user_input_error("Editing author failed", name.clone(), e))?;

        if updated.is_none() {
            tracing::debug!(name = %name, "editAuthor: no such author");
        }
        Ok(updated.map(Author::from))
    }
}
