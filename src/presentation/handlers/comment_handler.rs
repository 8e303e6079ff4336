use crate::{
    application::services::{AttachmentService, CommentCacheService},
    domain::entities::Comment,
    presentation::dto::{
        Validate,
        comment_dto::{
            CommentResponse, CreateCommentRequest, DeleteCommentRequest, UpdateCommentRequest,
        },
    },
    shared::error::AppError,
};
use std::sync::Arc;

pub struct CommentHandler {
    comment_cache: Arc<CommentCacheService>,
    attachments: Arc<AttachmentService>,
}

impl CommentHandler {
    pub fn new(comment_cache: Arc<CommentCacheService>, attachments: Arc<AttachmentService>) -> Self {
        Self {
            comment_cache,
            attachments,
        }
    }

    /// 投稿を開く。前の投稿のコメントを消してから取得する
    pub async fn open_post(&self, post_id: &str) -> Result<Vec<CommentResponse>, AppError> {
        if post_id.trim().is_empty() {
            return Err(AppError::invalid_input("投稿IDが必要です"));
        }
        self.comment_cache.clear();
        self.comment_cache.fetch_for_post(post_id).await?;
        Ok(self.list_comments())
    }

    pub fn close_post(&self) {
        self.comment_cache.clear();
    }

    pub fn list_comments(&self) -> Vec<CommentResponse> {
        self.comment_cache
            .snapshot()
            .comments
            .into_iter()
            .map(|comment| self.to_response(comment))
            .collect()
    }

    pub async fn create_comment(
        &self,
        request: CreateCommentRequest,
    ) -> Result<CommentResponse, AppError> {
        request.validate().map_err(AppError::InvalidInput)?;

        let comment = self
            .comment_cache
            .create(&request.post_id, request.content, request.image.map(Into::into))
            .await?;

        Ok(self.to_response(comment))
    }

    pub async fn update_comment(
        &self,
        request: UpdateCommentRequest,
    ) -> Result<CommentResponse, AppError> {
        request.validate().map_err(AppError::InvalidInput)?;

        let comment = self
            .comment_cache
            .update(
                &request.id,
                request.content,
                request.image.map(Into::into),
                request.old_image_path,
                request.remove_image,
            )
            .await?;

        Ok(self.to_response(comment))
    }

    pub async fn delete_comment(&self, request: DeleteCommentRequest) -> Result<(), AppError> {
        request.validate().map_err(AppError::InvalidInput)?;
        self.comment_cache
            .delete(&request.id, request.image_path)
            .await
    }

    fn to_response(&self, comment: Comment) -> CommentResponse {
        CommentResponse::from_comment(comment, |path| self.attachments.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::PostRepository;
    use crate::domain::entities::{NewPost, SessionUser};
    use crate::infrastructure::memory::InMemoryBackend;
    use crate::presentation::dto::AttachmentRequest;

    async fn setup() -> (Arc<InMemoryBackend>, CommentHandler, String) {
        let backend = Arc::new(InMemoryBackend::default());
        let user = SessionUser::new("user-1", "user-1@example.com");
        backend.sign_in(user.clone()).await;
        let post = backend
            .insert_post(NewPost::new(&user, "t".to_string(), "c".to_string()))
            .await
            .unwrap();
        let attachments = Arc::new(AttachmentService::new(backend.clone(), 1024));
        let cache = Arc::new(CommentCacheService::new(
            backend.clone(),
            backend.clone(),
            attachments.clone(),
        ));
        (backend, CommentHandler::new(cache, attachments), post.id)
    }

    fn image() -> AttachmentRequest {
        AttachmentRequest {
            file_name: "shot.jpeg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![9, 9],
        }
    }

    #[tokio::test]
    async fn comment_lifecycle_through_handler() {
        let (backend, handler, post_id) = setup().await;
        assert!(handler.open_post(&post_id).await.unwrap().is_empty());

        let created = handler
            .create_comment(CreateCommentRequest {
                post_id: post_id.clone(),
                content: "first".to_string(),
                image: Some(image()),
            })
            .await
            .unwrap();
        let path = created.image_path.clone().unwrap();
        assert!(path.starts_with("user-1/comments/"));
        assert!(path.ends_with(".jpeg"));
        assert!(!created.edited);

        let updated = handler
            .update_comment(UpdateCommentRequest {
                id: created.id.clone(),
                content: "edited".to_string(),
                image: None,
                old_image_path: Some(path.clone()),
                remove_image: true,
            })
            .await
            .unwrap();
        assert_eq!(updated.image_path, None);
        assert_eq!(updated.image_url, None);
        assert!(backend.blob(&path).await.is_none());
        assert_eq!(handler.list_comments(), vec![updated.clone()]);

        handler
            .delete_comment(DeleteCommentRequest {
                id: updated.id,
                image_path: None,
            })
            .await
            .unwrap();
        assert!(handler.list_comments().is_empty());
    }

    #[tokio::test]
    async fn close_post_empties_comment_list() {
        let (_, handler, post_id) = setup().await;
        handler.open_post(&post_id).await.unwrap();
        handler
            .create_comment(CreateCommentRequest {
                post_id,
                content: "hi".to_string(),
                image: None,
            })
            .await
            .unwrap();

        handler.close_post();
        assert!(handler.list_comments().is_empty());
    }
}
