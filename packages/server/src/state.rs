use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::cascade::{DeletionCoordinator, SeaOrmStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn store(&self) -> SeaOrmStore {
        SeaOrmStore::new(self.db.clone())
    }

    pub fn coordinator(&self) -> DeletionCoordinator<SeaOrmStore> {
        DeletionCoordinator::new(self.store(), self.blobs.clone())
    }
}
