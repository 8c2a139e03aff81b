pub mod adapter;
pub mod auth;
pub mod error;
pub mod memory;
pub mod store;

pub use adapter::PersistenceAdapter;
pub use auth::{AuthProvider, AuthSession, Credentials, UserId};
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use store::{DEFAULT_PROJECT_TITLE, ProjectRecord, ProjectStore};
