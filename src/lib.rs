// モジュール定義
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use application::{
    AttachmentService, CommentCacheService, CommentCacheState, PostCacheService, PostCacheState,
    RequestStatus,
};
pub use domain::entities::{Comment, Post, SessionUser};
pub use infrastructure::{
    ConnectionPool, FileBlobStore, InMemoryBackend, SqliteRepository, StaticSessionProvider,
};
pub use presentation::dto::ApiResponse;
pub use presentation::dto::comment_dto::CommentResponse;
pub use presentation::dto::post_dto::PostResponse;
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// ログ設定の初期化。`RUST_LOG` が無ければ `inkpost=debug,info`
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
