// Adapters layer: concrete implementations for external systems (http, storage).

pub mod http;
pub mod storage;

pub use http::{HttpCleaningApi, DEFAULT_API_URL};
pub use storage::LocalStorage;
