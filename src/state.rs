use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

use crate::error::Result;
use crate::repo::{
    ImageRepository, ShareRepository, TagHierarchy, TagRepository, TaggableRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub tags: TagRepository,
    pub tag_tree: TagHierarchy,
    pub shares: ShareRepository,
    pub images: ImageRepository,
    pub taggables: TaggableRepository,
    pub pool: Arc<SqlitePool>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        let tags = TagRepository::new();
        Self {
            tags,
            tag_tree: TagHierarchy::new(tags),
            shares: ShareRepository::new(),
            images: ImageRepository::new(),
            taggables: TaggableRepository::new(tags),
            pool: Arc::new(pool),
        }
    }

    /// Opens the unit of work for one request.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}
