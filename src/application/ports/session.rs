use crate::domain::entities::SessionUser;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 認証セッションの提供元
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<SessionUser>, AppError>;
}
