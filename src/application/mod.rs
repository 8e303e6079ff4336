pub mod ports;
pub mod services;

pub use services::{
    AttachmentService, CommentCacheService, CommentCacheState, PostCacheService, PostCacheState,
    RequestStatus,
};
