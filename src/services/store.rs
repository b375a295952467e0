//! Store service: owns the library store for lifecycle (start/stop/health).
//!
//! Services that need the store should declare `dependencies: ["store"]`.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, StoreBackendKind};
use crate::db::Database;
use crate::services::manager::{Service, ServiceHealth};
use crate::store::{LibraryStore, MemoryStore, SharedStore, seed_sample_data};

enum Backend {
    Sqlite(Database),
    Memory(Arc<MemoryStore>),
}

/// Service that owns the store and runs migrations and seeding on start.
/// Register this first so that services depending on `"store"` start after it.
pub struct StoreService {
    backend: Backend,
    seed: bool,
}

impl StoreService {
    pub fn sqlite(db: Database, seed: bool) -> Self {
        Self {
            backend: Backend::Sqlite(db),
            seed,
        }
    }

    pub fn memory(store: Arc<MemoryStore>, seed: bool) -> Self {
        Self {
            backend: Backend::Memory(store),
            seed,
        }
    }

    /// Connect the configured backend. Does not migrate; that happens in [Service::start].
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.store_backend {
            StoreBackendKind::Sqlite => {
                let db = Database::connect_with_retry(
                    &config.database_url,
                    config.database_max_connections,
                    config.database_connect_timeout,
                )
                .await
                .context("Store service: connect_with_retry failed")?;
                Ok(Self::sqlite(db, config.seed_sample_data))
            }
            StoreBackendKind::Memory => Ok(Self::memory(
                Arc::new(MemoryStore::new()),
                config.seed_sample_data,
            )),
        }
    }

    /// The store as a trait object, for resolvers and the auth service
    pub fn shared(&self) -> SharedStore {
        match &self.backend {
            Backend::Sqlite(db) => Arc::new(db.clone()),
            Backend::Memory(store) => store.clone(),
        }
    }

    fn store(&self) -> &dyn LibraryStore {
        match &self.backend {
            Backend::Sqlite(db) => db as &dyn LibraryStore,
            Backend::Memory(store) => store.as_ref(),
        }
    }
}

#[async_trait]
impl Service for StoreService {
    fn name(&self) -> &str {
        "store"
    }

    async fn start(&self) -> Result<()> {
        let store = self.store();
        info!(service = "store", backend = store.backend(), "Store service starting");
        store.ping().await.context("Store did not answer")?;

        if let Backend::Sqlite(db) = &self.backend {
            db.migrate().await.context("Failed to run migrations")?;
            info!(service = "store", "Migrations applied");
        }

        if self.seed {
            let seeded = seed_sample_data(store)
                .await
                .context("Failed to seed sample data")?;
            info!(
                service = "store",
                authors = seeded.authors_created,
                books = seeded.books_created,
                skipped = seeded.skipped,
                "Sample data seeded"
            );
        }

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Backend::Sqlite(db) = &self.backend {
            db.close().await;
        }
        info!(service = "store", "Store service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match self.store().ping().await {
            Ok(()) => Ok(ServiceHealth::healthy()),
            Err(e) => Ok(ServiceHealth::unhealthy(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_start_seeds() {
        let service = StoreService::memory(Arc::new(MemoryStore::new()), true);
        service.start().await.unwrap();

        let store = service.shared();
        assert_eq!(store.book_count().await.unwrap(), 7);
        assert_eq!(store.author_count().await.unwrap(), 5);
        assert!(service.health().await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_sqlite_start_migrates_and_stop_closes() {
        let db = Database::in_memory().await.unwrap();
        let service = StoreService::sqlite(db, false);
        service.start().await.unwrap();
        assert_eq!(service.shared().book_count().await.unwrap(), 0);

        service.stop().await.unwrap();
        assert!(!service.health().await.unwrap().is_healthy());
    }
}
