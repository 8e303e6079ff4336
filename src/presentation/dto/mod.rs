// DTOモジュール
pub mod comment_dto;
pub mod post_dto;

// 共通のレスポンス型
use crate::domain::value_objects::ImageUpload;
use crate::shared::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn from_app_error(error: AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        }
    }

    pub fn from_result(result: crate::shared::Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::from_app_error(err),
        }
    }
}

// 添付ファイル
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl From<AttachmentRequest> for ImageUpload {
    fn from(request: AttachmentRequest) -> Self {
        ImageUpload::new(request.file_name, request.content_type, request.bytes)
    }
}

// バリデーショントレイト
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub(crate) fn validate_text(
    value: &str,
    max_chars: usize,
    empty: &str,
    too_long: &str,
) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(empty.to_string());
    }
    if value.chars().count() > max_chars {
        return Err(too_long.to_string());
    }
    Ok(())
}
