use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionUser;

/// 投稿に紐づくコメント行。`post_id` は作成後に変わらない
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn was_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
}

impl NewComment {
    pub fn new(author: &SessionUser, post_id: String, content: String) -> Self {
        Self {
            post_id,
            content,
            author_id: author.id.clone(),
            author_email: author.email.clone(),
            image_path: None,
        }
    }

    pub fn with_image_path(mut self, image_path: Option<String>) -> Self {
        self.image_path = image_path;
        self
    }
}

/// 編集時のパッチ。`updated_at` は呼び出し側が現在時刻で埋める
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentPatch {
    pub content: String,
    pub image_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}
