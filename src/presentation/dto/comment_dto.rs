use super::{AttachmentRequest, Validate, validate_text};
use crate::domain::entities::Comment;
use serde::{Deserialize, Serialize};

const MAX_COMMENT_CHARS: usize = 2_000;

// レスポンスDTO
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub edited: bool,
}

impl CommentResponse {
    pub fn from_comment(comment: Comment, resolve_url: impl Fn(&str) -> String) -> Self {
        let image_url = comment.image_path.as_deref().map(&resolve_url);
        let edited = comment.was_edited();
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            author_id: comment.author_id,
            author_email: comment.author_email,
            image_path: comment.image_path,
            image_url,
            created_at: comment.created_at.timestamp_millis(),
            updated_at: comment.updated_at.timestamp_millis(),
            edited,
        }
    }
}

// リクエストDTO
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub content: String,
    pub image: Option<AttachmentRequest>,
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.post_id.trim().is_empty() {
            return Err("投稿IDが必要です".to_string());
        }
        validate_comment_content(&self.content)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub id: String,
    pub content: String,
    pub image: Option<AttachmentRequest>,
    pub old_image_path: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

impl Validate for UpdateCommentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("コメントIDが必要です".to_string());
        }
        validate_comment_content(&self.content)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub id: String,
    pub image_path: Option<String>,
}

impl Validate for DeleteCommentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("コメントIDが必要です".to_string());
        }
        Ok(())
    }
}

fn validate_comment_content(content: &str) -> Result<(), String> {
    validate_text(
        content,
        MAX_COMMENT_CHARS,
        "コメントが空です",
        "コメントが長すぎます（最大2000文字）",
    )
}
