use super::SqliteRepository;
use super::mapper::{backend_error, map_post_row, truncate_to_millis};
use super::queries::{DELETE_COMMENTS_BY_POST, DELETE_POST, INSERT_POST, SELECT_POSTS, UPDATE_POST};
use crate::application::ports::PostRepository;
use crate::domain::entities::{NewPost, Post, PostPatch};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl PostRepository for SqliteRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query(SELECT_POSTS)
            .fetch_all(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(map_post_row(&row)?);
        }
        Ok(posts)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let created = Post {
            id: Uuid::new_v4().to_string(),
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author_email: post.author_email,
            image_path: post.image_path,
            created_at: truncate_to_millis(Utc::now()),
        };

        sqlx::query(INSERT_POST)
            .bind(&created.id)
            .bind(&created.title)
            .bind(&created.content)
            .bind(&created.author_id)
            .bind(&created.author_email)
            .bind(created.image_path.as_deref())
            .bind(created.created_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        Ok(created)
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, AppError> {
        let row = sqlx::query(UPDATE_POST)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.content)
            .bind(patch.image_path.as_deref())
            .fetch_optional(self.pool.get_pool())
            .await
            .map_err(backend_error)?;

        match row {
            Some(row) => map_post_row(&row),
            None => Err(AppError::NotFound(format!("post {id}"))),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .get_pool()
            .begin()
            .await
            .map_err(backend_error)?;

        sqlx::query(DELETE_COMMENTS_BY_POST)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(backend_error)?;
        sqlx::query(DELETE_POST)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(backend_error)?;

        tx.commit().await.map_err(backend_error)?;
        Ok(())
    }
}
