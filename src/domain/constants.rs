/// 投稿行のテーブル名
pub const POSTS_TABLE: &str = "posts";
/// コメント行のテーブル名
pub const COMMENTS_TABLE: &str = "comments";
/// 画像添付用のバケット名（既定値。`StorageConfig::bucket` で上書き可能）
pub const POST_FILES_BUCKET: &str = "post-files";
