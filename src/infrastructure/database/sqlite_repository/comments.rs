use super::SqliteRepository;
use super::mapper::{backend_error, map_comment_row, truncate_to_millis};
use super::queries::{
    COUNT_COMMENTS_BY_POST, DELETE_COMMENT, INSERT_COMMENT, SELECT_COMMENTS_BY_POST,
    UPDATE_COMMENT,
};
use crate::application::ports::CommentRepository;
use crate::domain::entities::{Comment, CommentPatch, NewComment};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

#[async_trait]
impl CommentRepository for SqliteRepository {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query(SELECT_COMMENTS_BY_POST)
            .bind(post_id)
            .fetch_all(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(map_comment_row(&row)?);
        }
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let now = truncate_to_millis(Utc::now());
        let created = Comment {
            id: Uuid::new_v4().to_string(),
            content: comment.content,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_email: comment.author_email,
            image_path: comment.image_path,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(INSERT_COMMENT)
            .bind(&created.id)
            .bind(&created.post_id)
            .bind(&created.content)
            .bind(&created.author_id)
            .bind(&created.author_email)
            .bind(created.image_path.as_deref())
            .bind(created.created_at.timestamp_millis())
            .bind(created.updated_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        Ok(created)
    }

    async fn update_comment(&self, id: &str, patch: CommentPatch) -> Result<Comment, AppError> {
        let row = sqlx::query(UPDATE_COMMENT)
            .bind(id)
            .bind(&patch.content)
            .bind(patch.image_path.as_deref())
            .bind(patch.updated_at.timestamp_millis())
            .fetch_optional(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        match row {
            Some(row) => map_comment_row(&row),
            None => Err(AppError::NotFound(format!("comment {id}"))),
        }
    }

    async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        sqlx::query(DELETE_COMMENT)
            .bind(id)
            .execute(self.pool.get_pool())
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn count_comments(&self, post_id: &str) -> Result<u64, AppError> {
        let row = sqlx::query(COUNT_COMMENTS_BY_POST)
            .bind(post_id)
            .fetch_one(self.pool.get_pool())
            .await
            .map_err(backend_error)?;
        let count: i64 = row.try_get("count").map_err(backend_error)?;
        Ok(count.max(0) as u64)
    }
}
