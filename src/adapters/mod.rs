// Adapters layer: concrete implementations for external systems (http, secure storage).

pub mod http;
pub mod storage;

pub use http::{HttpMethod, RequestConfig, RequestExecutor};
pub use storage::{FileSecretStorage, MemorySecretStorage};
