use crate::domain::value_objects::{ImageUpload, StorageKey};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 画像添付用バケットのポート
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &StorageKey, file: &ImageUpload) -> Result<(), AppError>;

    /// 呼び出し側はベストエフォートとして扱う（失敗は握りつぶされる）
    async fn remove(&self, key: &str) -> Result<(), AppError>;

    /// 公開 URL の解決。ネットワークを伴わない純粋な関数
    fn public_url(&self, key: &str) -> String;
}
