use super::attachment_service::AttachmentService;
use super::cache_status::RequestStatus;
use super::session_guard::require_user;
use crate::application::ports::{PostRepository, SessionProvider};
use crate::domain::entities::{NewPost, Post, PostPatch};
use crate::domain::value_objects::ImageUpload;
use crate::shared::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 投稿キャッシュのスナップショット
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostCacheState {
    pub posts: Vec<Post>,
    pub status: RequestStatus,
    pub error: Option<String>,
}

/// 投稿一覧のメモリキャッシュ。
///
/// 全取得で `created_at` 降順に丸ごと差し替え、作成は先頭に追加、更新は同じ位置で置換する。
/// 状態の変更はすべてこのサービスの操作経由で行い、`subscribe` で購読できる。
pub struct PostCacheService {
    repository: Arc<dyn PostRepository>,
    session: Arc<dyn SessionProvider>,
    attachments: Arc<AttachmentService>,
    state: watch::Sender<PostCacheState>,
}

impl PostCacheService {
    pub fn new(
        repository: Arc<dyn PostRepository>,
        session: Arc<dyn SessionProvider>,
        attachments: Arc<AttachmentService>,
    ) -> Self {
        let (state, _) = watch::channel(PostCacheState::default());
        Self {
            repository,
            session,
            attachments,
            state,
        }
    }

    pub fn snapshot(&self) -> PostCacheState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PostCacheState> {
        self.state.subscribe()
    }

    pub fn find(&self, id: &str) -> Option<Post> {
        self.state.borrow().posts.iter().find(|p| p.id == id).cloned()
    }

    /// 全投稿を取得してキャッシュを差し替える。失敗時は既存の投稿を残す
    pub async fn fetch_all(&self) -> Result<(), AppError> {
        debug!("fetching all posts");
        self.state.send_modify(|state| {
            state.status = RequestStatus::Loading;
            state.error = None;
        });

        match self.repository.list_posts().await {
            Ok(posts) => {
                debug!(count = posts.len(), "fetched posts");
                self.state.send_modify(|state| {
                    state.status = RequestStatus::Succeeded;
                    state.posts = posts;
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch posts");
                let message = err.to_string();
                self.state.send_modify(|state| {
                    state.status = RequestStatus::Failed;
                    state.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// 投稿を作成して先頭に追加する。画像のアップロードに失敗した場合は行を作らない
    pub async fn create(
        &self,
        title: String,
        content: String,
        file: Option<ImageUpload>,
    ) -> Result<Post, AppError> {
        let created = match self.insert(title, content, file.as_ref()).await {
            Ok(post) => post,
            Err(err) => return Err(self.record_error(err)),
        };

        info!(post_id = %created.id, "created post");
        let cached = created.clone();
        self.state.send_modify(|state| state.posts.insert(0, cached));
        Ok(created)
    }

    /// 投稿を更新して同じ位置で置換する。キャッシュに無い id は何もしない。
    ///
    /// 新しい画像がある場合は古い画像を先に削除してからアップロードするため、
    /// アップロードに失敗すると古い画像は失われる。
    pub async fn update(
        &self,
        id: &str,
        title: String,
        content: String,
        file: Option<ImageUpload>,
        old_image_path: Option<String>,
    ) -> Result<Post, AppError> {
        let updated = match self
            .patch(id, title, content, file.as_ref(), old_image_path)
            .await
        {
            Ok(post) => post,
            Err(err) => return Err(self.record_error(err)),
        };

        let cached = updated.clone();
        let replaced = self.state.send_if_modified(|state| {
            match state.posts.iter_mut().find(|p| p.id == id) {
                Some(slot) => {
                    *slot = cached;
                    true
                }
                None => false,
            }
        });
        if replaced {
            info!(post_id = id, "updated post");
        } else {
            debug!(post_id = id, "updated post is not cached, skipping");
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if let Err(err) = self.repository.delete_post(id).await {
            return Err(self.record_error(err));
        }

        let removed = self.state.send_if_modified(|state| {
            match state.posts.iter().position(|p| p.id == id) {
                Some(index) => {
                    state.posts.remove(index);
                    true
                }
                None => false,
            }
        });
        info!(post_id = id, removed, "deleted post");
        Ok(())
    }

    async fn insert(
        &self,
        title: String,
        content: String,
        file: Option<&ImageUpload>,
    ) -> Result<Post, AppError> {
        let user = require_user(self.session.as_ref()).await?;

        let image_path = match file {
            Some(file) => Some(self.attachments.upload_post_image(&user, file).await?),
            None => None,
        };

        let draft = NewPost::new(&user, title, content).with_image_path(image_path);
        self.repository.insert_post(draft).await
    }

    async fn patch(
        &self,
        id: &str,
        title: String,
        content: String,
        file: Option<&ImageUpload>,
        old_image_path: Option<String>,
    ) -> Result<Post, AppError> {
        let user = require_user(self.session.as_ref()).await?;

        let image_path = match file {
            Some(file) => {
                self.attachments.validate(file)?;
                self.attachments
                    .remove_best_effort(old_image_path.as_deref())
                    .await;
                Some(self.attachments.upload_post_image(&user, file).await?)
            }
            None => old_image_path,
        };

        let patch = PostPatch {
            title,
            content,
            image_path,
        };
        self.repository.update_post(id, patch).await
    }

    fn record_error(&self, err: AppError) -> AppError {
        warn!(error = %err, "post mutation failed");
        let message = err.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::BlobStore;
    use crate::domain::entities::SessionUser;
    use crate::domain::value_objects::StorageKey;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use mockall::{Sequence, mock, predicate::*};

    mock! {
        pub PostRepo {}

        #[async_trait]
        impl PostRepository for PostRepo {
            async fn list_posts(&self) -> Result<Vec<Post>, AppError>;
            async fn insert_post(&self, post: NewPost) -> Result<Post, AppError>;
            async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, AppError>;
            async fn delete_post(&self, id: &str) -> Result<(), AppError>;
        }
    }

    mock! {
        pub Session {}

        #[async_trait]
        impl SessionProvider for Session {
            async fn current_session(&self) -> Result<Option<SessionUser>, AppError>;
        }
    }

    mock! {
        pub Blobs {}

        #[async_trait]
        impl BlobStore for Blobs {
            async fn upload(&self, key: &StorageKey, file: &ImageUpload) -> Result<(), AppError>;
            async fn remove(&self, key: &str) -> Result<(), AppError>;
            fn public_url(&self, key: &str) -> String;
        }
    }

    fn post(id: &str, minutes_ago: i64) -> Post {
        Post {
            id: id.to_string(),
            title: format!("title {id}"),
            content: format!("content {id}"),
            author_id: "user-1".to_string(),
            author_email: "user-1@example.com".to_string(),
            image_path: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn signed_in() -> MockSession {
        let mut session = MockSession::new();
        session
            .expect_current_session()
            .returning(|| Ok(Some(SessionUser::new("user-1", "user-1@example.com"))));
        session
    }

    fn signed_out() -> MockSession {
        let mut session = MockSession::new();
        session.expect_current_session().returning(|| Ok(None));
        session
    }

    fn service(repo: MockPostRepo, session: MockSession, blobs: MockBlobs) -> PostCacheService {
        let attachments = Arc::new(AttachmentService::new(Arc::new(blobs), 1024 * 1024));
        PostCacheService::new(Arc::new(repo), Arc::new(session), attachments)
    }

    async fn seeded(mut repo: MockPostRepo, session: MockSession, blobs: MockBlobs) -> PostCacheService {
        repo.expect_list_posts()
            .times(1)
            .returning(|| Ok(vec![post("p2", 1), post("p1", 10)]));
        let service = service(repo, session, blobs);
        service.fetch_all().await.unwrap();
        service
    }

    fn png() -> ImageUpload {
        ImageUpload::new("new.png", "image/png", vec![9u8; 4])
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_posts() {
        let mut repo = MockPostRepo::new();
        let mut seq = Sequence::new();
        repo.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![post("p1", 0)]));
        repo.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(AppError::backend("connection reset")));
        let service = service(repo, signed_in(), MockBlobs::new());

        service.fetch_all().await.unwrap();
        let result = service.fetch_all().await;

        let state = service.snapshot();
        assert!(result.is_err());
        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("connection reset"));
        assert_eq!(state.posts.len(), 1);
        assert_eq!(state.posts[0].id, "p1");
    }

    #[tokio::test]
    async fn successful_fetch_clears_error() {
        let mut repo = MockPostRepo::new();
        let mut seq = Sequence::new();
        repo.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(AppError::backend("timeout")));
        repo.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));
        let service = service(repo, signed_in(), MockBlobs::new());

        let _ = service.fetch_all().await;
        service.fetch_all().await.unwrap();

        let state = service.snapshot();
        assert_eq!(state.status, RequestStatus::Succeeded);
        assert!(state.error.is_none());
        assert!(state.posts.is_empty());
    }

    #[tokio::test]
    async fn create_prepends_even_when_older() {
        let mut repo = MockPostRepo::new();
        repo.expect_insert_post()
            .withf(|draft| draft.author_id == "user-1" && draft.image_path.is_none())
            .times(1)
            .returning(|draft| {
                let mut created = post("p3", 60);
                created.title = draft.title;
                Ok(created)
            });
        let service = seeded(repo, signed_in(), MockBlobs::new()).await;

        let created = service
            .create("hello".to_string(), "body".to_string(), None)
            .await
            .unwrap();

        let state = service.snapshot();
        assert_eq!(created.id, "p3");
        assert_eq!(state.posts.len(), 3);
        assert_eq!(state.posts[0].id, "p3");
        assert_eq!(state.posts[0].title, "hello");
    }

    #[tokio::test]
    async fn create_requires_session() {
        let mut repo = MockPostRepo::new();
        repo.expect_insert_post().never();
        let service = service(repo, signed_out(), MockBlobs::new());

        let err = service
            .create("t".to_string(), "c".to_string(), None)
            .await
            .unwrap_err();

        assert_eq!(err, AppError::Unauthenticated);
        assert_eq!(service.snapshot().error.as_deref(), Some("User not authenticated"));
    }

    #[tokio::test]
    async fn create_with_failed_upload_inserts_nothing() {
        let mut repo = MockPostRepo::new();
        repo.expect_insert_post().never();
        let mut blobs = MockBlobs::new();
        blobs
            .expect_upload()
            .times(1)
            .returning(|_, _| Err(AppError::backend("Bucket not found")));
        let service = service(repo, signed_in(), blobs);

        let err = service
            .create("t".to_string(), "c".to_string(), Some(png()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Bucket not found");
        assert!(service.snapshot().posts.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let mut repo = MockPostRepo::new();
        repo.expect_update_post()
            .withf(|id, patch| id == "p1" && patch.image_path.as_deref() == Some("user-1/1_old.png"))
            .times(1)
            .returning(|id, patch| {
                let mut updated = post(id, 10);
                updated.title = patch.title;
                updated.image_path = patch.image_path;
                Ok(updated)
            });
        let service = seeded(repo, signed_in(), MockBlobs::new()).await;

        service
            .update(
                "p1",
                "edited".to_string(),
                "body".to_string(),
                None,
                Some("user-1/1_old.png".to_string()),
            )
            .await
            .unwrap();

        let state = service.snapshot();
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.posts[1].id, "p1");
        assert_eq!(state.posts[1].title, "edited");
    }

    #[tokio::test]
    async fn update_with_new_file_removes_old_blob_first() {
        let mut seq = Sequence::new();
        let mut blobs = MockBlobs::new();
        blobs
            .expect_remove()
            .with(eq("user-1/1_old.png"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::backend("Object not found")));
        blobs
            .expect_upload()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let mut repo = MockPostRepo::new();
        repo.expect_update_post()
            .withf(|_, patch| {
                patch
                    .image_path
                    .as_deref()
                    .is_some_and(|p| p.starts_with("user-1/") && p.ends_with("_new.png"))
            })
            .times(1)
            .returning(|id, patch| {
                let mut updated = post(id, 10);
                updated.image_path = patch.image_path;
                Ok(updated)
            });
        let service = seeded(repo, signed_in(), blobs).await;

        let updated = service
            .update(
                "p1",
                "t".to_string(),
                "c".to_string(),
                Some(png()),
                Some("user-1/1_old.png".to_string()),
            )
            .await
            .unwrap();

        assert!(updated.image_path.unwrap().ends_with("_new.png"));
    }

    #[tokio::test]
    async fn update_of_uncached_post_is_a_silent_no_op() {
        let mut repo = MockPostRepo::new();
        repo.expect_update_post()
            .returning(|id, _| Ok(post(id, 0)));
        let service = seeded(repo, signed_in(), MockBlobs::new()).await;
        let before = service.snapshot().posts;

        let result = service
            .update("missing", "t".to_string(), "c".to_string(), None, None)
            .await;

        assert!(result.is_ok());
        assert_eq!(service.snapshot().posts, before);
    }

    #[tokio::test]
    async fn delete_removes_exact_match_only() {
        let mut repo = MockPostRepo::new();
        repo.expect_delete_post().returning(|_| Ok(()));
        let service = seeded(repo, signed_in(), MockBlobs::new()).await;

        service.delete("p").await.unwrap();
        assert_eq!(service.snapshot().posts.len(), 2);

        service.delete("p2").await.unwrap();
        let ids: Vec<String> = service.snapshot().posts.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_posts() {
        let mut repo = MockPostRepo::new();
        repo.expect_delete_post()
            .with(eq("p1"))
            .returning(|_| Err(AppError::backend("permission denied")));
        let service = seeded(repo, signed_in(), MockBlobs::new()).await;

        let err = service.delete("p1").await.unwrap_err();

        let state = service.snapshot();
        assert_eq!(err.to_string(), "permission denied");
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.error.as_deref(), Some("permission denied"));
        assert_eq!(state.status, RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn find_returns_cached_post() {
        let service = seeded(MockPostRepo::new(), signed_in(), MockBlobs::new()).await;

        assert_eq!(service.find("p2").map(|p| p.id), Some("p2".to_string()));
        assert!(service.find("p9").is_none());
    }
}
