use serde::{Deserialize, Serialize};

/// 認証済みセッションのユーザー
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// id が空のセッションは未認証として扱う
    pub fn is_authenticated(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
