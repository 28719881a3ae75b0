pub mod catalog_http;
pub mod storage;

pub use catalog_http::DummyJsonCatalogAdapter;
pub use storage::{FileStorage, MemoryStorage};
