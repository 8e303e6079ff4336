pub mod constants;
pub mod entities;
pub mod value_objects;

pub use constants::{COMMENTS_TABLE, POST_FILES_BUCKET, POSTS_TABLE};
pub use entities::{Comment, NewComment, NewPost, Post, SessionUser};
pub use value_objects::{ImageUpload, StorageKey};
