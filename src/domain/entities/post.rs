use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionUser;

/// バックエンドに保存された投稿行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 挿入前の投稿。`id` と `created_at` はバックエンドが割り当てる
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub image_path: Option<String>,
}

impl NewPost {
    pub fn new(author: &SessionUser, title: String, content: String) -> Self {
        Self {
            title,
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
}
