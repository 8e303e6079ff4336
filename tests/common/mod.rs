#![allow(dead_code)]

use async_trait::async_trait;
use inkpost_lib::application::ports::{BlobStore, CommentRepository, PostRepository};
use inkpost_lib::domain::entities::{
    Comment, CommentPatch, NewComment, NewPost, Post, PostPatch, SessionUser,
};
use inkpost_lib::domain::value_objects::{ImageUpload, StorageKey};
use inkpost_lib::shared::error::AppError;
use inkpost_lib::{AttachmentService, CommentCacheService, InMemoryBackend, PostCacheService};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const MAX_UPLOAD_BYTES: u64 = 1024;

pub fn alice() -> SessionUser {
    SessionUser::new("alice", "alice@example.com")
}

pub fn png(name: &str) -> ImageUpload {
    ImageUpload::new(name, "image/png", vec![0x89u8, b'P', b'N', b'G'])
}

/// 画像のアップロードだけ失敗させられる Blob ストア
pub struct FlakyBlobStore {
    inner: Arc<InMemoryBackend>,
    fail_uploads: AtomicBool,
    removed: Mutex<Vec<String>>,
}

impl FlakyBlobStore {
    pub fn new(inner: Arc<InMemoryBackend>) -> Self {
        Self {
            inner,
            fail_uploads: AtomicBool::new(false),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn upload(&self, key: &StorageKey, file: &ImageUpload) -> Result<(), AppError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::backend("storage unavailable"));
        }
        self.inner.upload(key, file).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.removed.lock().unwrap().push(key.to_string());
        self.inner.remove(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}

/// 応答を止めておけるリクエスト。`release` で応答を返す
pub struct Scripted<T> {
    gate: oneshot::Receiver<()>,
    response: Result<T, AppError>,
}

pub fn scripted<T>(response: Result<T, AppError>) -> (oneshot::Sender<()>, Scripted<T>) {
    let (tx, gate) = oneshot::channel();
    (tx, Scripted { gate, response })
}

/// 更新リクエストを止めておくゲートの列。ゲートが開いてから内側に委譲する
#[derive(Default)]
pub struct UpdateGates {
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl UpdateGates {
    pub fn push(&self) -> oneshot::Sender<()> {
        let (tx, gate) = oneshot::channel();
        self.gates.lock().unwrap().push_back(gate);
        tx
    }

    async fn wait(&self) {
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

async fn next_scripted<T>(queue: &Mutex<VecDeque<Scripted<T>>>) -> Option<Result<T, AppError>> {
    let next = queue.lock().unwrap().pop_front();
    match next {
        Some(scripted) => {
            let _ = scripted.gate.await;
            Some(scripted.response)
        }
        None => None,
    }
}

/// 一覧取得の応答順を制御できる投稿リポジトリ。台本が空なら内側に委譲する
pub struct GatedPostRepository {
    inner: Arc<InMemoryBackend>,
    lists: Mutex<VecDeque<Scripted<Vec<Post>>>>,
    updates: UpdateGates,
}

impl GatedPostRepository {
    pub fn new(inner: Arc<InMemoryBackend>) -> Self {
        Self {
            inner,
            lists: Mutex::new(VecDeque::new()),
            updates: UpdateGates::default(),
        }
    }

    pub fn push_list(&self, scripted: Scripted<Vec<Post>>) {
        self.lists.lock().unwrap().push_back(scripted);
    }

    /// 次の `update_post` を返り値の送信まで止める
    pub fn gate_next_update(&self) -> oneshot::Sender<()> {
        self.updates.push()
    }
}

#[async_trait]
impl PostRepository for GatedPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        match next_scripted(&self.lists).await {
            Some(response) => response,
            None => self.inner.list_posts().await,
        }
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        self.inner.insert_post(post).await
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, AppError> {
        self.updates.wait().await;
        self.inner.update_post(id, patch).await
    }

    async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete_post(id).await
    }
}

/// コメント一覧の応答順を制御できるリポジトリ
pub struct GatedCommentRepository {
    inner: Arc<InMemoryBackend>,
    lists: Mutex<VecDeque<Scripted<Vec<Comment>>>>,
    updates: UpdateGates,
}

impl GatedCommentRepository {
    pub fn new(inner: Arc<InMemoryBackend>) -> Self {
        Self {
            inner,
            lists: Mutex::new(VecDeque::new()),
            updates: UpdateGates::default(),
        }
    }

    pub fn push_list(&self, scripted: Scripted<Vec<Comment>>) {
        self.lists.lock().unwrap().push_back(scripted);
    }

    pub fn gate_next_update(&self) -> oneshot::Sender<()> {
        self.updates.push()
    }
}

#[async_trait]
impl CommentRepository for GatedCommentRepository {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        match next_scripted(&self.lists).await {
            Some(response) => response,
            None => self.inner.list_comments(post_id).await,
        }
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        self.inner.insert_comment(comment).await
    }

    async fn update_comment(&self, id: &str, patch: CommentPatch) -> Result<Comment, AppError> {
        self.updates.wait().await;
        self.inner.update_comment(id, patch).await
    }

    async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete_comment(id).await
    }

    async fn count_comments(&self, post_id: &str) -> Result<u64, AppError> {
        self.inner.count_comments(post_id).await
    }
}

/// メモリ上のバックエンドに両キャッシュをつないだテスト環境
pub struct Harness {
    pub backend: Arc<InMemoryBackend>,
    pub blobs: Arc<FlakyBlobStore>,
    pub posts_repo: Arc<GatedPostRepository>,
    pub comments_repo: Arc<GatedCommentRepository>,
    pub attachments: Arc<AttachmentService>,
    pub posts: PostCacheService,
    pub comments: CommentCacheService,
}

impl Harness {
    pub async fn signed_in() -> Self {
        let harness = Self::signed_out();
        harness.backend.sign_in(alice()).await;
        harness
    }

    pub fn signed_out() -> Self {
        let backend = Arc::new(InMemoryBackend::default());
        let blobs = Arc::new(FlakyBlobStore::new(backend.clone()));
        let posts_repo = Arc::new(GatedPostRepository::new(backend.clone()));
        let comments_repo = Arc::new(GatedCommentRepository::new(backend.clone()));
        let attachments = Arc::new(AttachmentService::new(blobs.clone(), MAX_UPLOAD_BYTES));
        let posts = PostCacheService::new(posts_repo.clone(), backend.clone(), attachments.clone());
        let comments =
            CommentCacheService::new(comments_repo.clone(), backend.clone(), attachments.clone());

        Self {
            backend,
            blobs,
            posts_repo,
            comments_repo,
            attachments,
            posts,
            comments,
        }
    }

    /// キャッシュを通さずにバックエンドへ直接投稿を入れる
    pub async fn seed_post(&self, title: &str) -> Post {
        self.backend
            .insert_post(NewPost::new(&alice(), title.to_string(), "body".to_string()))
            .await
            .unwrap()
    }

    pub async fn seed_comment(&self, post_id: &str, content: &str) -> Comment {
        self.backend
            .insert_comment(NewComment::new(
                &alice(),
                post_id.to_string(),
                content.to_string(),
            ))
            .await
            .unwrap()
    }
}
