pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{FileSecretStorage, MemorySecretStorage, RequestConfig};
pub use app::AulaClient;
pub use config::{ClientConfig, OperatingMode};
pub use core::{FallbackDataSet, ResponseEnvelope, SessionContext};
pub use domain::model::{Credentials, SessionState};
pub use utils::error::{AccessError, Result};
