pub(super) const SELECT_POSTS: &str = r#"
    SELECT id, title, content, author_id, author_email, image_path, created_at
    FROM posts
    ORDER BY created_at DESC, rowid DESC
"#;

pub(super) const INSERT_POST: &str = r#"
    INSERT INTO posts (id, title, content, author_id, author_email, image_path, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub(super) const UPDATE_POST: &str = r#"
    UPDATE posts
    SET title = ?2, content = ?3, image_path = ?4
    WHERE id = ?1
    RETURNING id, title, content, author_id, author_email, image_path, created_at
"#;

pub(super) const DELETE_COMMENTS_BY_POST: &str = r#"
    DELETE FROM comments
    WHERE post_id = ?
"#;

pub(super) const DELETE_POST: &str = r#"
    DELETE FROM posts
    WHERE id = ?
"#;

pub(super) const SELECT_COMMENTS_BY_POST: &str = r#"
    SELECT id, post_id, content, author_id, author_email, image_path, created_at, updated_at
    FROM comments
    WHERE post_id = ?
    ORDER BY created_at DESC, rowid DESC
"#;

pub(super) const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (
        id,
        post_id,
        content,
        author_id,
        author_email,
        image_path,
        created_at,
        updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub(super) const UPDATE_COMMENT: &str = r#"
    UPDATE comments
    SET content = ?2, image_path = ?3, updated_at = ?4
    WHERE id = ?1
    RETURNING id, post_id, content, author_id, author_email, image_path, created_at, updated_at
"#;

pub(super) const DELETE_COMMENT: &str = r#"
    DELETE FROM comments
    WHERE id = ?
"#;

pub(super) const COUNT_COMMENTS_BY_POST: &str = r#"
    SELECT COUNT(*) AS count
    FROM comments
    WHERE post_id = ?
"#;
