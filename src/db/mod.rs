pub mod catalog;
pub mod library;
pub mod postgres;
pub mod redis;
pub mod slot_store;

pub use catalog::PgTitleCatalog;
pub use library::PgLibraryOracle;
pub use postgres::{create_pool, run_migrations};
pub use self::redis::{create_redis_client, CacheKey, SummaryCache};
pub use slot_store::PgSlotStore;
