use spacesweep_domain::Config;
use spacesweep_infrastructure::repositories::{SqliteSpaceStore, SqliteSweepLock};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct Repositories {
    pub space_store: Arc<SqliteSpaceStore>,
    pub sweep_lock: Arc<SqliteSweepLock>,
}

impl Repositories {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        let space_store = SqliteSpaceStore::new(pool.clone())
            .with_page_size(config.database.page_size)
            .with_batch_size(config.sweep.batch_size);
        Self {
            space_store: Arc::new(space_store),
            sweep_lock: Arc::new(SqliteSweepLock::new(pool, config.lock.lock_id.clone())),
        }
    }
}
