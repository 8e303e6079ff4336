use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `post-files` バケット内のオブジェクトキー。先頭セグメントはユーザー ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Storage key cannot be empty".to_string());
        }
        if value.starts_with('/') || value.contains('\\') {
            return Err(format!("Storage key must be a relative path: {value}"));
        }
        if value
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(format!("Storage key contains an invalid segment: {value}"));
        }
        Ok(Self(value))
    }

    /// 投稿画像: `{user_id}/{unix_millis}_{file_name}`
    pub fn for_post_image(user_id: &str, file_name: &str, now: DateTime<Utc>) -> Self {
        Self(format!(
            "{}/{}_{}",
            user_id,
            now.timestamp_millis(),
            sanitize_file_name(file_name)
        ))
    }

    /// コメント画像: `{user_id}/comments/{unix_millis}_{suffix}.{ext}`
    pub fn for_comment_image(
        user_id: &str,
        file_name: &str,
        now: DateTime<Utc>,
        random_suffix: &str,
    ) -> Self {
        let extension = file_extension(file_name)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        Self(format!(
            "{}/comments/{}_{}{}",
            user_id,
            now.timestamp_millis(),
            random_suffix,
            extension
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next()?;
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
