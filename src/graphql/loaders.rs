//! GraphQL DataLoaders for batching store reads
//!
//! Resolving `allBooks { author { name } }` would otherwise cost one author
//! lookup per book. [`AuthorLoader`] collects the author ids requested in the
//! same tick and fetches them with a single store call.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;

use crate::store::{SharedStore, StoreError};

use super::types::Author;

pub struct AuthorLoader {
    store: SharedStore,
}

impl AuthorLoader {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl Loader<String> for AuthorLoader {
    type Value = Author;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        tracing::debug!(count = keys.len(), "Batch loading authors");

        let authors = self.store.get_authors_by_ids(keys).await.map_err(Arc::new)?;
        Ok(authors
            .into_iter()
            .map(|a| (a.id.clone(), Author::from(a)))
            .collect())
    }
}
