pub mod classifier;
pub mod credentials;
pub mod envelope;
pub mod fallback;
pub mod policy;
pub mod session;

pub use credentials::{SecureCredentialStore, StoredCredentials};
pub use envelope::ResponseEnvelope;
pub use fallback::{Collection, FallbackDataSet};
pub use policy::{OperationKind, ServiceContext};
pub use session::SessionContext;
