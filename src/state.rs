use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::application::ports::{BlobStore, CommentRepository, PostRepository};
use crate::application::services::{AttachmentService, CommentCacheService, PostCacheService};
use crate::infrastructure::{
    ConnectionPool, FileBlobStore, InMemoryBackend, SqliteRepository, StaticSessionProvider,
};
use crate::presentation::handlers::{CommentHandler, PostHandler};
use crate::shared::{AppConfig, AppError};

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub sessions: Arc<StaticSessionProvider>,
    pub attachments: Arc<AttachmentService>,
    pub post_cache: Arc<PostCacheService>,
    pub comment_cache: Arc<CommentCacheService>,
    pub post_handler: Arc<PostHandler>,
    pub comment_handler: Arc<CommentHandler>,
}

impl AppState {
    /// SQLite とローカルディスクのバケットで組み立てる
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;

        if let Some(path) = sqlite_file_path(&config.database.url)
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = ConnectionPool::new(&config.database.url, config.database.max_connections)
            .await?;
        let repository = Arc::new(SqliteRepository::new(pool));
        repository.initialize().await?;
        info!(url = %config.database.url, "database initialized");

        let blob_store = Arc::new(
            FileBlobStore::new(
                &config.storage.root_dir,
                &config.storage.bucket,
                &config.storage.public_base_url,
            )
            .await?,
        );
        info!(dir = %blob_store.bucket_dir().display(), "blob store initialized");

        Ok(Self::assemble(
            config,
            repository.clone(),
            repository,
            blob_store,
        ))
    }

    /// すべてメモリ上で動く状態。ローカル確認とテスト用
    pub fn in_memory(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let backend = Arc::new(InMemoryBackend::new(
            &config.storage.bucket,
            &config.storage.public_base_url,
        ));
        Ok(Self::assemble(
            config,
            backend.clone(),
            backend.clone(),
            backend,
        ))
    }

    fn assemble(
        config: AppConfig,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        let sessions = Arc::new(StaticSessionProvider::new());
        let attachments = Arc::new(AttachmentService::new(
            blob_store,
            config.storage.max_upload_bytes,
        ));
        let post_cache = Arc::new(PostCacheService::new(
            posts,
            sessions.clone(),
            attachments.clone(),
        ));
        let comment_cache = Arc::new(CommentCacheService::new(
            comments,
            sessions.clone(),
            attachments.clone(),
        ));
        let post_handler = Arc::new(PostHandler::new(
            post_cache.clone(),
            comment_cache.clone(),
            attachments.clone(),
        ));
        let comment_handler = Arc::new(CommentHandler::new(
            comment_cache.clone(),
            attachments.clone(),
        ));

        Self {
            config,
            sessions,
            attachments,
            post_cache,
            comment_cache,
            post_handler,
            comment_handler,
        }
    }
}

/// `sqlite:` URL からファイルパスを取り出す。インメモリ DB は `None`
fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(path)
    }
}
