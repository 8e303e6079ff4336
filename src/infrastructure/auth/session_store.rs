use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::ports::SessionProvider;
use crate::domain::entities::SessionUser;
use crate::shared::error::AppError;

/// 現在のセッションをメモリ上に保持するだけのプロバイダ
#[derive(Default)]
pub struct StaticSessionProvider {
    current: RwLock<Option<SessionUser>>,
}

impl StaticSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            current: RwLock::new(Some(user)),
        }
    }

    pub async fn sign_in(&self, user: SessionUser) {
        info!(user_id = %user.id, "signed in");
        *self.current.write().await = Some(user);
    }

    pub async fn sign_out(&self) {
        if let Some(user) = self.current.write().await.take() {
            info!(user_id = %user.id, "signed out");
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<SessionUser>, AppError> {
        Ok(self.current.read().await.clone())
    }
}
