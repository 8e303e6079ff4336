pub mod attachment_service;
pub mod cache_status;
pub mod comment_cache_service;
pub mod post_cache_service;
mod session_guard;

pub use attachment_service::AttachmentService;
pub use cache_status::RequestStatus;
pub use comment_cache_service::{CommentCacheService, CommentCacheState};
pub use post_cache_service::{PostCacheService, PostCacheState};
