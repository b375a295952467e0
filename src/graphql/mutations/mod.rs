pub mod authors;
pub mod books;
pub mod user;

pub use authors::AuthorMutations;
pub use books::BookMutations;
pub use user::UserMutations;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::graphql::auth::MutationGuard;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::{AuthService, LibraryEvent, LibraryEvents};
    pub(crate) use crate::store::{CreateAuthor, CreateBook, CreateUser, SharedStore};
}
