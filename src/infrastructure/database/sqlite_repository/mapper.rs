use crate::domain::entities::{Comment, Post};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::{Row, sqlite::SqliteRow};

/// 行操作の失敗は SQLite のメッセージをそのまま `Backend` として返す
pub(super) fn backend_error(err: sqlx::Error) -> AppError {
    AppError::backend(err.to_string())
}

pub(super) fn map_post_row(row: &SqliteRow) -> Result<Post, AppError> {
    decode_post(row).map_err(backend_error)
}

pub(super) fn map_comment_row(row: &SqliteRow) -> Result<Comment, AppError> {
    decode_comment(row).map_err(backend_error)
}

fn decode_post(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    let created_at: i64 = row.try_get("created_at")?;

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        author_email: row.try_get("author_email")?,
        image_path: row.try_get("image_path")?,
        created_at: from_millis(created_at),
    })
}

fn decode_comment(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        author_email: row.try_get("author_email")?,
        image_path: row.try_get("image_path")?,
        created_at: from_millis(created_at),
        updated_at: from_millis(updated_at),
    })
}

/// 保存はミリ秒精度なので、返却値も同じ精度に揃える
pub(super) fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(at.timestamp_millis())
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}
