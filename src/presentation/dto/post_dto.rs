use super::{AttachmentRequest, Validate, validate_text};
use crate::domain::entities::Post;
use serde::{Deserialize, Serialize};

const MAX_TITLE_CHARS: usize = 200;
const MAX_CONTENT_CHARS: usize = 10_000;

// レスポンスDTO
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub comment_count: u64,
}

impl PostResponse {
    /// `resolve_url` は画像パスから公開 URL を作る関数
    pub fn from_post(post: Post, comment_count: u64, resolve_url: impl Fn(&str) -> String) -> Self {
        let image_url = post.image_path.as_deref().map(&resolve_url);
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author_email: post.author_email,
            image_path: post.image_path,
            image_url,
            created_at: post.created_at.timestamp_millis(),
            comment_count,
        }
    }
}

// リクエストDTO
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub image: Option<AttachmentRequest>,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), String> {
        validate_post_fields(&self.title, &self.content)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image: Option<AttachmentRequest>,
    pub old_image_path: Option<String>,
}

impl Validate for UpdatePostRequest {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("投稿IDが必要です".to_string());
        }
        validate_post_fields(&self.title, &self.content)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostRequest {
    pub post_id: String,
}

impl Validate for DeletePostRequest {
    fn validate(&self) -> Result<(), String> {
        if self.post_id.trim().is_empty() {
            return Err("投稿IDが必要です".to_string());
        }
        Ok(())
    }
}

fn validate_post_fields(title: &str, content: &str) -> Result<(), String> {
    validate_text(
        title,
        MAX_TITLE_CHARS,
        "タイトルが空です",
        "タイトルが長すぎます（最大200文字）",
    )?;
    validate_text(
        content,
        MAX_CONTENT_CHARS,
        "投稿内容が空です",
        "投稿内容が長すぎます（最大10000文字）",
    )
}
