pub mod catalog;
pub mod catalog_http;
pub mod library;
pub mod recommendations;
pub mod store;

pub use catalog::{CachedTitleCatalog, TitleCatalog};
pub use catalog_http::HttpTitleCatalog;
pub use library::LibraryOracle;
pub use recommendations::RecommendationService;
pub use store::{MemorySlotStore, SlotStore, SlotUnitOfWork};
