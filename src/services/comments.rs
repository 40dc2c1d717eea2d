use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{Comment, CreateCommentRequest},
    services::identity::{Capability, Identity},
    utils::html::clean_html,
};

const COMMENT_COLUMNS: &str = "id, thread_id, user_id, content, likes, dislikes, username, created_at";

/// Adds a comment to a visible thread. Comments need no approval.
pub async fn create_comment(
    pool: &SqlitePool,
    identity: &Identity,
    thread_id: i64,
    payload: CreateCommentRequest,
) -> Result<Comment, AppError> {
    let author_id = identity.authorize(Capability::CreateComment)?;
    payload.validate()?;

    let content = clean_html(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
    }

    // Visibility check and insert in one statement: it queues on the write lock.
    let comment: Comment = sqlx::query_as(&format!(
        r#"
        INSERT INTO comments (thread_id, user_id, content, username)
        SELECT ?1, ?2, ?3, ?4
        WHERE EXISTS (SELECT 1 FROM threads WHERE id = ?1 AND (approved = 1 OR ?5))
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(thread_id)
    .bind(author_id)
    .bind(&content)
    .bind(identity.username().unwrap_or_default())
    .bind(identity.can(Capability::ReviewThreads))
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

    tracing::debug!(comment_id = comment.id, thread_id, author_id, "comment created");
    Ok(comment)
}

/// Comments of a thread, oldest first.
pub async fn list_comments(pool: &SqlitePool, thread_id: i64) -> Result<Vec<Comment>, AppError> {
    let comments = sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE thread_id = ? ORDER BY id ASC"
    ))
    .bind(thread_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

pub(crate) async fn list_comments_by_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE user_id = ? ORDER BY id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
