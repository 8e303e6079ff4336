pub mod blob_store;
pub mod repositories;
pub mod session;

pub use blob_store::BlobStore;
pub use repositories::{CommentRepository, PostRepository};
pub use session::SessionProvider;
