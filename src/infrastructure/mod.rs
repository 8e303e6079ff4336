pub mod auth;
pub mod database;
pub mod memory;
pub mod storage;

pub use auth::StaticSessionProvider;
pub use database::{ConnectionPool, SqliteRepository};
pub use memory::InMemoryBackend;
pub use storage::FileBlobStore;
