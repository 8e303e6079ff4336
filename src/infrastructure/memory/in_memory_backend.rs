use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::application::ports::{BlobStore, CommentRepository, PostRepository, SessionProvider};
use crate::domain::constants::{COMMENTS_TABLE, POST_FILES_BUCKET};
use crate::domain::entities::{
    Comment, CommentPatch, NewComment, NewPost, Post, PostPatch, SessionUser,
};
use crate::domain::value_objects::{ImageUpload, StorageKey};
use crate::shared::error::AppError;

const NO_ROWS_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

/// 行・Blob・セッションをすべてメモリ上で扱うバックエンド。
/// ローカル実行とテスト用で、プロセスが終われば中身は消える
pub struct InMemoryBackend {
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    blobs: RwLock<HashMap<String, ImageUpload>>,
    session: RwLock<Option<SessionUser>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    bucket: String,
    public_base_url: String,
}

impl InMemoryBackend {
    pub fn new(bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            comments: RwLock::new(Vec::new()),
            blobs: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            last_timestamp: Mutex::new(None),
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn sign_in(&self, user: SessionUser) {
        *self.session.write().await = Some(user);
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
    }

    pub async fn blob(&self, key: &str) -> Option<ImageUpload> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn blob_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 同じ時刻の行ができないよう、単調増加する時刻を払い出す
    async fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().await;
        let now = Utc::now();
        let next = match *last {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(POST_FILES_BUCKET, "http://localhost/storage/v1/object/public")
    }
}

#[async_trait]
impl PostRepository for InMemoryBackend {
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let mut posts = self.posts.read().await.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
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
            created_at: self.next_timestamp().await,
        };
        self.posts.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, AppError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::backend(NO_ROWS_MESSAGE))?;
        post.title = patch.title;
        post.content = patch.content;
        post.image_path = patch.image_path;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        self.posts.write().await.retain(|p| p.id != id);
        self.comments.write().await.retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryBackend {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let post_exists = self
            .posts
            .read()
            .await
            .iter()
            .any(|p| p.id == comment.post_id);
        if !post_exists {
            return Err(AppError::backend(format!(
                "insert or update on table \"{COMMENTS_TABLE}\" violates foreign key constraint"
            )));
        }

        let now = self.next_timestamp().await;
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
        self.comments.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_comment(&self, id: &str, patch: CommentPatch) -> Result<Comment, AppError> {
        let mut comments = self.comments.write().await;
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::backend(NO_ROWS_MESSAGE))?;
        comment.content = patch.content;
        comment.image_path = patch.image_path;
        comment.updated_at = patch.updated_at;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        self.comments.write().await.retain(|c| c.id != id);
        Ok(())
    }

    async fn count_comments(&self, post_id: &str) -> Result<u64, AppError> {
        let count = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl BlobStore for InMemoryBackend {
    async fn upload(&self, key: &StorageKey, file: &ImageUpload) -> Result<(), AppError> {
        let mut blobs = self.blobs.write().await;
        if blobs.contains_key(key.as_str()) {
            return Err(AppError::backend("The resource already exists"));
        }
        blobs.insert(key.to_string(), file.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        // Removing a missing object succeeds, like the hosted storage API
        self.blobs.write().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

#[async_trait]
impl SessionProvider for InMemoryBackend {
    async fn current_session(&self) -> Result<Option<SessionUser>, AppError> {
        Ok(self.session.read().await.clone())
    }
}
