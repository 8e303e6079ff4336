pub mod comment;
pub mod post;
pub mod session;

pub use comment::{Comment, CommentPatch, NewComment};
pub use post::{NewPost, Post, PostPatch};
pub use session::SessionUser;
