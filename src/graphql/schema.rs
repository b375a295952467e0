//! GraphQL schema definition with queries, mutations, and subscriptions

use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use async_graphql::{MergedObject, Schema, extensions};

use crate::services::{AuthService, LibraryEvents};
use crate::store::SharedStore;

use super::loaders::AuthorLoader;
use super::mutations::{AuthorMutations, BookMutations, UserMutations};
use super::queries::{AuthorQueries, BookQueries, UserQueries};
use super::subscriptions::SubscriptionRoot;

/// The GraphQL schema type
pub type LibrarySchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(BookQueries, AuthorQueries, UserQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(BookMutations, AuthorMutations, UserMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(
    store: SharedStore,
    auth: Arc<AuthService>,
    events: LibraryEvents,
) -> LibrarySchema {
    let author_loader = DataLoader::new(AuthorLoader::new(store.clone()), tokio::spawn);

    Schema::build(QueryRoot::default(), MutationRoot::default(), SubscriptionRoot)
        .extension(extensions::Tracing)
        .data(store)
        .data(auth)
        .data(events)
        .data(author_loader)
        .finish()
}
