use crate::{
    application::services::{AttachmentService, CommentCacheService, PostCacheService},
    domain::entities::Post,
    presentation::dto::{
        Validate,
        post_dto::{CreatePostRequest, DeletePostRequest, PostResponse, UpdatePostRequest},
    },
    shared::error::AppError,
};
use std::sync::Arc;

pub struct PostHandler {
    post_cache: Arc<PostCacheService>,
    comment_cache: Arc<CommentCacheService>,
    attachments: Arc<AttachmentService>,
}

impl PostHandler {
    pub fn new(
        post_cache: Arc<PostCacheService>,
        comment_cache: Arc<CommentCacheService>,
        attachments: Arc<AttachmentService>,
    ) -> Self {
        Self {
            post_cache,
            comment_cache,
            attachments,
        }
    }

    /// キャッシュ中の投稿をそのまま返す
    pub fn list_posts(&self) -> Vec<PostResponse> {
        self.post_cache
            .snapshot()
            .posts
            .into_iter()
            .map(|post| self.to_response(post))
            .collect()
    }

    /// 投稿を取得し直す。`with_counts` ならコメント数もまとめて取得する
    pub async fn refresh_feed(&self, with_counts: bool) -> Result<Vec<PostResponse>, AppError> {
        self.post_cache.fetch_all().await?;

        if with_counts {
            let ids: Vec<String> = self
                .post_cache
                .snapshot()
                .posts
                .into_iter()
                .map(|p| p.id)
                .collect();
            self.comment_cache.fetch_counts(&ids).await?;
        }

        Ok(self.list_posts())
    }

    pub async fn create_post(&self, request: CreatePostRequest) -> Result<PostResponse, AppError> {
        // 入力検証
        request.validate().map_err(AppError::InvalidInput)?;

        let post = self
            .post_cache
            .create(request.title, request.content, request.image.map(Into::into))
            .await?;

        Ok(self.to_response(post))
    }

    pub async fn update_post(&self, request: UpdatePostRequest) -> Result<PostResponse, AppError> {
        request.validate().map_err(AppError::InvalidInput)?;

        let post = self
            .post_cache
            .update(
                &request.id,
                request.title,
                request.content,
                request.image.map(Into::into),
                request.old_image_path,
            )
            .await?;

        Ok(self.to_response(post))
    }

    pub async fn delete_post(&self, request: DeletePostRequest) -> Result<(), AppError> {
        request.validate().map_err(AppError::InvalidInput)?;
        self.post_cache.delete(&request.post_id).await
    }

    fn to_response(&self, post: Post) -> PostResponse {
        let count = self.comment_cache.comment_count(&post.id);
        PostResponse::from_post(post, count, |path| self.attachments.public_url(path))
    }
}
