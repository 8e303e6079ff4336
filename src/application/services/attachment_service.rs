use crate::application::ports::BlobStore;
use crate::domain::entities::SessionUser;
use crate::domain::value_objects::{ImageUpload, StorageKey};
use crate::shared::error::AppError;
use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::Arc;
use tracing::{debug, warn};

const COMMENT_KEY_SUFFIX_LEN: usize = 8;

/// 投稿・コメントの画像添付を扱う。キーの生成、アップロード、ベストエフォート削除
pub struct AttachmentService {
    blob_store: Arc<dyn BlobStore>,
    max_upload_bytes: u64,
}

impl AttachmentService {
    pub fn new(blob_store: Arc<dyn BlobStore>, max_upload_bytes: u64) -> Self {
        Self {
            blob_store,
            max_upload_bytes,
        }
    }

    /// アップロード前の検証。古い画像を消す前に呼ぶ
    pub fn validate(&self, file: &ImageUpload) -> Result<(), AppError> {
        if file.is_empty() {
            return Err(AppError::invalid_input(format!(
                "Attachment {} is empty",
                file.file_name
            )));
        }
        if file.len() as u64 > self.max_upload_bytes {
            return Err(AppError::invalid_input(format!(
                "Attachment size exceeds limit ({} bytes > {} bytes)",
                file.len(),
                self.max_upload_bytes
            )));
        }
        if !file.is_image() {
            return Err(AppError::invalid_input(format!(
                "Attachment must be an image (got {})",
                file.content_type
            )));
        }
        Ok(())
    }

    pub async fn upload_post_image(
        &self,
        owner: &SessionUser,
        file: &ImageUpload,
    ) -> Result<String, AppError> {
        let key = StorageKey::for_post_image(&owner.id, &file.file_name, Utc::now());
        self.upload(key, file).await
    }

    pub async fn upload_comment_image(
        &self,
        owner: &SessionUser,
        file: &ImageUpload,
    ) -> Result<String, AppError> {
        let key = StorageKey::for_comment_image(
            &owner.id,
            &file.file_name,
            Utc::now(),
            &random_suffix(),
        );
        self.upload(key, file).await
    }

    /// 古い画像の削除。失敗はログに残すだけで呼び出し側には返さない
    pub async fn remove_best_effort(&self, path: Option<&str>) {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return;
        };
        match self.blob_store.remove(path).await {
            Ok(()) => debug!(path, "removed attachment"),
            Err(err) => warn!(path, error = %err, "failed to remove attachment, ignoring"),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        self.blob_store.public_url(path)
    }

    async fn upload(&self, key: StorageKey, file: &ImageUpload) -> Result<String, AppError> {
        self.validate(file)?;
        self.blob_store.upload(&key, file).await.map_err(|err| {
            warn!(key = %key, error = %err, "attachment upload failed");
            err
        })?;
        debug!(key = %key, owner = key.owner(), bytes = file.len(), "uploaded attachment");
        Ok(key.into())
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(COMMENT_KEY_SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}
