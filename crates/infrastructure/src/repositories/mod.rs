pub mod space_store_repository;
pub mod sweep_lock_repository;

pub use space_store_repository::SqliteSpaceStore;
pub use sweep_lock_repository::SqliteSweepLock;
