use crate::domain::entities::{Comment, CommentPatch, NewComment, NewPost, Post, PostPatch};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// `posts` テーブルの行操作
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// 全件を `created_at` の降順で取得
    async fn list_posts(&self) -> Result<Vec<Post>, AppError>;
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError>;
    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, AppError>;
    async fn delete_post(&self, id: &str) -> Result<(), AppError>;
}

/// `comments` テーブルの行操作
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// 指定投稿のコメントを `created_at` の降順で取得
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError>;
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError>;
    async fn update_comment(&self, id: &str, patch: CommentPatch) -> Result<Comment, AppError>;
    async fn delete_comment(&self, id: &str) -> Result<(), AppError>;
    /// 行データを返さない件数クエリ
    async fn count_comments(&self, post_id: &str) -> Result<u64, AppError>;
}
