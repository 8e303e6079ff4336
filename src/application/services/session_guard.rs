use crate::application::ports::SessionProvider;
use crate::domain::entities::SessionUser;
use crate::shared::error::AppError;
use tracing::warn;

/// 認証済みユーザーを取得する。セッションが無い・取得できない・id が空の場合は `Unauthenticated`
pub(crate) async fn require_user(session: &dyn SessionProvider) -> Result<SessionUser, AppError> {
    match session.current_session().await {
        Ok(Some(user)) if user.is_authenticated() => Ok(user),
        Ok(_) => Err(AppError::Unauthenticated),
        Err(err) => {
            warn!(error = %err, "failed to read session");
            Err(AppError::Unauthenticated)
        }
    }
}
