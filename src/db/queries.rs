use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{Comment, NewPost, Post, PostWithAuthor, Session, User, UserSummary};

const COMMENT_COLUMNS: &str = r"
    c.id, c.post_id, c.author_id, c.parent_id, c.content, c.created_at, c.updated_at,
    COALESCE(NULLIF(TRIM(u.display_name), ''), u.username) AS author_name
";

const POST_COLUMNS: &str = r"
    p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
    COALESCE(NULLIF(TRIM(u.display_name), ''), u.username) AS author_name,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
";

// ==================== User Queries ====================

/// Create a new user.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    display_name: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO users (username, display_name)
        VALUES (?, ?)
        ",
    )
    .bind(username)
    .bind(display_name)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_rowid())
}

/// Get a user by ID.
pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT id, username, display_name, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by id")
}

/// List every user with their post count, by name.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserSummary>> {
    sqlx::query_as(
        r"
        SELECT u.id, u.username, u.display_name, u.created_at,
            (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count
        FROM users u
        ORDER BY LOWER(COALESCE(NULLIF(TRIM(u.display_name), ''), u.username)), u.id
        ",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list users")
}

/// Update a user's display name.
pub async fn update_user_display_name(
    pool: &SqlitePool,
    user_id: i64,
    display_name: &str,
) -> Result<()> {
    sqlx::query("UPDATE users SET display_name = ? WHERE id = ?")
        .bind(display_name)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update display name")?;
    Ok(())
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.0)
}

// ==================== Session Queries ====================

/// Create a session for a user. `expires_at` is an RFC 3339 timestamp.
pub async fn create_session(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO sessions (user_id, token, expires_at)
        VALUES (?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(result.last_insert_rowid())
}

/// Get a session by token.
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    sqlx::query_as(
        "SELECT id, user_id, token, expires_at, created_at, last_used_at FROM sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch session by token")
}

/// Update session last_used_at.
pub async fn update_session_last_used(pool: &SqlitePool, session_id: i64) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_used_at = datetime('now') WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await
        .context("Failed to update session last_used")?;
    Ok(())
}

/// Delete a session.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;
    Ok(())
}

/// Delete every session whose expiry is in the past.
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;
    Ok(result.rows_affected())
}

// ==================== Post Queries ====================

/// Insert a new post.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (author_id, title, content)
        VALUES (?, ?, ?)
        ",
    )
    .bind(post.author_id)
    .bind(&post.title)
    .bind(&post.content)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(result.last_insert_rowid())
}

/// Get a bare post by ID.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as(
        "SELECT id, author_id, title, content, created_at, updated_at FROM posts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch post")
}

/// Get a post with its author name and comment count.
pub async fn get_post_with_author(pool: &SqlitePool, id: i64) -> Result<Option<PostWithAuthor>> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON p.author_id = u.id WHERE p.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch post with author")
}

/// List the most recent posts, newest first.
pub async fn list_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<PostWithAuthor>> {
    sqlx::query_as(&format!(
        r"
        SELECT {POST_COLUMNS}
        FROM posts p
        JOIN users u ON p.author_id = u.id
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ?
        "
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list posts")
}

/// List posts written by one user, newest first.
pub async fn list_posts_by_author(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Vec<PostWithAuthor>> {
    sqlx::query_as(&format!(
        r"
        SELECT {POST_COLUMNS}
        FROM posts p
        JOIN users u ON p.author_id = u.id
        WHERE p.author_id = ?
        ORDER BY p.created_at DESC, p.id DESC
        "
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list posts by author")
}

/// Update a post's title and content.
pub async fn update_post(pool: &SqlitePool, id: i64, title: &str, content: &str) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET title = ?, content = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(title)
    .bind(content)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;
    Ok(())
}

/// Delete a post. Its comments are removed by the foreign key cascade.
pub async fn delete_post(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(result.rows_affected())
}

// ==================== Comment Queries ====================

/// Insert a comment. `parent_id` is `None` for top-level comments.
pub async fn insert_comment(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    parent_id: Option<i64>,
    content: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO comments (post_id, author_id, parent_id, content)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(content)
    .execute(pool)
    .await
    .context("Failed to insert comment")?;

    Ok(result.last_insert_rowid())
}

/// Get a specific comment with author info.
pub async fn get_comment(pool: &SqlitePool, comment_id: i64) -> Result<Option<Comment>> {
    sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON c.author_id = u.id WHERE c.id = ?"
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment")
}

/// Get all comments for a post with author info, oldest first.
pub async fn get_comments_for_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Comment>> {
    sqlx::query_as(&format!(
        r"
        SELECT {COMMENT_COLUMNS}
        FROM comments c
        JOIN users u ON c.author_id = u.id
        WHERE c.post_id = ?
        ORDER BY c.created_at ASC, c.id ASC
        "
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to get comments for post")
}

/// Count comments on a post.
pub async fn count_comments_for_post(pool: &SqlitePool, post_id: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
    Ok(row.0)
}

/// Replace a comment's content.
pub async fn update_comment_content(
    pool: &SqlitePool,
    comment_id: i64,
    content: &str,
) -> Result<()> {
    sqlx::query("UPDATE comments SET content = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(content)
        .bind(comment_id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;
    Ok(())
}

/// Delete a comment. Replies are removed by the foreign key cascade.
pub async fn delete_comment(pool: &SqlitePool, comment_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(result.rows_affected())
}
