use super::attachment_service::AttachmentService;
use super::cache_status::RequestStatus;
use super::session_guard::require_user;
use crate::application::ports::{CommentRepository, SessionProvider};
use crate::domain::entities::{Comment, CommentPatch, NewComment};
use crate::domain::value_objects::ImageUpload;
use crate::shared::error::AppError;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// コメントキャッシュのスナップショット
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentCacheState {
    /// 表示中の投稿 1 件分のコメントだけを保持する
    pub comments: Vec<Comment>,
    /// 投稿 ID → コメント数。エントリが無い投稿は「不明」（呼び出し側は 0 扱い）
    pub comment_counts: HashMap<String, u64>,
    /// `comments` のスコープになっている投稿
    pub active_post_id: Option<String>,
    pub status: RequestStatus,
    pub error: Option<String>,
}

/// 表示中の投稿のコメントと、投稿ごとのコメント数を保持するキャッシュ
pub struct CommentCacheService {
    repository: Arc<dyn CommentRepository>,
    session: Arc<dyn SessionProvider>,
    attachments: Arc<AttachmentService>,
    state: watch::Sender<CommentCacheState>,
}

impl CommentCacheService {
    pub fn new(
        repository: Arc<dyn CommentRepository>,
        session: Arc<dyn SessionProvider>,
        attachments: Arc<AttachmentService>,
    ) -> Self {
        let (state, _) = watch::channel(CommentCacheState::default());
        Self {
            repository,
            session,
            attachments,
            state,
        }
    }

    pub fn snapshot(&self) -> CommentCacheState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CommentCacheState> {
        self.state.subscribe()
    }

    pub fn comment_count(&self, post_id: &str) -> u64 {
        self.state
            .borrow()
            .comment_counts
            .get(post_id)
            .copied()
            .unwrap_or(0)
    }

    /// 表示中のコメントを空にする。コメント数は投稿横断なので残す
    pub fn clear(&self) {
        self.state.send_modify(|state| {
            state.comments.clear();
            state.active_post_id = None;
            state.status = RequestStatus::Idle;
            state.error = None;
        });
    }

    /// 投稿のコメントを取得してキャッシュを差し替える。
    ///
    /// 投稿を切り替えるときは直前に `clear` を呼ぶこと。応答が返る前に別の投稿へ
    /// 切り替わっていた場合、その応答は捨てる。
    pub async fn fetch_for_post(&self, post_id: &str) -> Result<(), AppError> {
        debug!(post_id, "fetching comments");
        self.state.send_modify(|state| {
            state.active_post_id = Some(post_id.to_string());
            state.status = RequestStatus::Loading;
            state.error = None;
        });

        let result = self.repository.list_comments(post_id).await;

        if self.state.borrow().active_post_id.as_deref() != Some(post_id) {
            debug!(post_id, "comment scope changed while fetching, discarding response");
            return result.map(|_| ());
        }

        match result {
            Ok(comments) => {
                debug!(post_id, count = comments.len(), "fetched comments");
                self.state.send_modify(|state| {
                    state.status = RequestStatus::Succeeded;
                    state.comments = comments
                        .into_iter()
                        .filter(|c| c.post_id == post_id)
                        .collect();
                });
                Ok(())
            }
            Err(err) => {
                warn!(post_id, error = %err, "failed to fetch comments");
                let message = err.to_string();
                self.state.send_modify(|state| {
                    state.status = RequestStatus::Failed;
                    state.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// 投稿ごとのコメント数を 1 件ずつ順番に問い合わせる。
    /// どれか 1 件でも失敗したらマップは変更しない
    pub async fn fetch_counts(&self, post_ids: &[String]) -> Result<HashMap<String, u64>, AppError> {
        let mut counts = HashMap::with_capacity(post_ids.len());
        for post_id in post_ids {
            match self.repository.count_comments(post_id).await {
                Ok(count) => {
                    counts.insert(post_id.clone(), count);
                }
                Err(err) => {
                    warn!(post_id = %post_id, error = %err, "failed to count comments");
                    return Err(self.record_error(err));
                }
            }
        }

        debug!(posts = counts.len(), "fetched comment counts");
        let merged = counts.clone();
        self.state
            .send_modify(|state| state.comment_counts.extend(merged));
        Ok(counts)
    }

    /// コメントを作成して先頭に追加し、投稿のコメント数を 1 増やす。
    ///
    /// 別の投稿を表示中の場合はコメント数だけ増やし、一覧には追加しない。
    pub async fn create(
        &self,
        post_id: &str,
        content: String,
        file: Option<ImageUpload>,
    ) -> Result<Comment, AppError> {
        let created = match self.insert(post_id, content, file.as_ref()).await {
            Ok(comment) => comment,
            Err(err) => return Err(self.record_error(err)),
        };

        info!(comment_id = %created.id, post_id, "created comment");
        let cached = created.clone();
        self.state.send_modify(|state| {
            let in_scope = state
                .active_post_id
                .as_deref()
                .is_none_or(|active| active == cached.post_id);
            let count = state
                .comment_counts
                .entry(cached.post_id.clone())
                .or_insert(0);
            *count += 1;
            if in_scope {
                state.comments.insert(0, cached);
            }
        });
        Ok(created)
    }

    /// コメントを更新して同じ位置で置換する。
    ///
    /// 画像の扱いは優先順に (a) 削除指定 → 古い画像を消して `None`、
    /// (b) 新しいファイル → 古い画像を消してからアップロード、(c) どちらも無し → そのまま。
    pub async fn update(
        &self,
        id: &str,
        content: String,
        file: Option<ImageUpload>,
        old_image_path: Option<String>,
        should_remove_image: bool,
    ) -> Result<Comment, AppError> {
        let updated = match self
            .patch(id, content, file.as_ref(), old_image_path, should_remove_image)
            .await
        {
            Ok(comment) => comment,
            Err(err) => return Err(self.record_error(err)),
        };

        let cached = updated.clone();
        let replaced = self.state.send_if_modified(|state| {
            match state.comments.iter_mut().find(|c| c.id == id) {
                Some(slot) => {
                    *slot = cached;
                    true
                }
                None => false,
            }
        });
        if replaced {
            info!(comment_id = id, "updated comment");
        } else {
            debug!(comment_id = id, "updated comment is not cached, skipping");
        }
        Ok(updated)
    }

    /// 画像をベストエフォートで削除してから行を削除する。
    /// 行の削除に失敗しても画像の削除は巻き戻さない
    pub async fn delete(&self, id: &str, image_path: Option<String>) -> Result<(), AppError> {
        self.attachments
            .remove_best_effort(image_path.as_deref())
            .await;

        if let Err(err) = self.repository.delete_comment(id).await {
            return Err(self.record_error(err));
        }

        let removed = self.state.send_if_modified(|state| {
            let Some(index) = state.comments.iter().position(|c| c.id == id) else {
                return false;
            };
            let removed = state.comments.remove(index);
            if let Some(count) = state.comment_counts.get_mut(&removed.post_id) {
                *count = count.saturating_sub(1);
            }
            true
        });
        info!(comment_id = id, removed, "deleted comment");
        Ok(())
    }

    async fn insert(
        &self,
        post_id: &str,
        content: String,
        file: Option<&ImageUpload>,
    ) -> Result<Comment, AppError> {
        let user = require_user(self.session.as_ref()).await?;

        let image_path = match file {
            Some(file) => Some(self.attachments.upload_comment_image(&user, file).await?),
            None => None,
        };

        let draft =
            NewComment::new(&user, post_id.to_string(), content).with_image_path(image_path);
        self.repository.insert_comment(draft).await
    }

    async fn patch(
        &self,
        id: &str,
        content: String,
        file: Option<&ImageUpload>,
        old_image_path: Option<String>,
        should_remove_image: bool,
    ) -> Result<Comment, AppError> {
        let user = require_user(self.session.as_ref()).await?;

        let image_path = if should_remove_image {
            self.attachments
                .remove_best_effort(old_image_path.as_deref())
                .await;
            None
        } else if let Some(file) = file {
            self.attachments.validate(file)?;
            self.attachments
                .remove_best_effort(old_image_path.as_deref())
                .await;
            Some(self.attachments.upload_comment_image(&user, file).await?)
        } else {
            old_image_path
        };

        let patch = CommentPatch {
            content,
            image_path,
            updated_at: Utc::now(),
        };
        self.repository.update_comment(id, patch).await
    }

    fn record_error(&self, err: AppError) -> AppError {
        warn!(error = %err, "comment operation failed");
        let message = err.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        err
    }
}
