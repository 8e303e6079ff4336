use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::warn;

use crate::application::ports::BlobStore;
use crate::domain::value_objects::{ImageUpload, StorageKey};
use crate::shared::error::AppError;

/// ローカルディスク上のバケット。`{root_dir}/{bucket}/{key}` に保存する
pub struct FileBlobStore {
    bucket_dir: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl FileBlobStore {
    pub async fn new(
        root_dir: impl Into<PathBuf>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let bucket = bucket.into();
        let bucket_dir = root_dir.into().join(&bucket);
        fs::create_dir_all(&bucket_dir).await.map_err(|err| {
            AppError::Storage(format!("Failed to create bucket dir: {err}"))
        })?;

        Ok(Self {
            bucket_dir,
            bucket,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.object_path(key)?;
        fs::read(&path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => AppError::backend("Object not found"),
            _ => AppError::backend(format!("Failed to read object {key}: {err}")),
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, AppError> {
        let key = StorageKey::new(key.to_string()).map_err(AppError::Backend)?;
        Ok(self.bucket_dir.join(key.as_str()))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn upload(&self, key: &StorageKey, file: &ImageUpload) -> Result<(), AppError> {
        let path = self.object_path(key.as_str())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| AppError::backend(format!("Failed to create object dir: {err}")))?;
        }

        // Existing objects are never overwritten
        let mut handle = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::AlreadyExists => AppError::backend("The resource already exists"),
                _ => AppError::backend(format!("Failed to write object {key}: {err}")),
            })?;
        write_or_discard(&mut handle, &path, &file.bytes)
            .await
            .map_err(|err| AppError::backend(format!("Failed to write object {key}: {err}")))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let path = self.object_path(key)?;
        fs::remove_file(&path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => AppError::backend("Object not found"),
            _ => AppError::backend(format!("Failed to remove object {key}: {err}")),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

/// 書き込みに失敗したら書きかけのファイルを消してからエラーを返す
async fn write_or_discard<W>(writer: &mut W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(err) => Err(err),
    };

    if written.is_err()
        && let Err(cleanup) = fs::remove_file(path).await
    {
        warn!(path = %path.display(), error = %cleanup, "failed to remove partial object");
    }
    written
}
