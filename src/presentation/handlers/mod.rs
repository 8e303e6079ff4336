pub mod comment_handler;
pub mod post_handler;

pub use comment_handler::CommentHandler;
pub use post_handler::PostHandler;
