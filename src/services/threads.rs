//! Thread lifecycle: `Pending -> Approved`, and `Pending | Approved -> Deleted`.
//!
//! Every thread starts pending, whoever writes it. Rejecting a thread deletes
//! it together with its comments, votes and reports.

use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::thread::{CreateThreadRequest, Thread, ThreadDetail, ThreadListParams, ThreadView},
    services::{
        comments,
        identity::{Capability, Identity},
    },
    utils::html::clean_html,
};

const THREAD_COLUMNS: &str =
    "id, category_id, user_id, title, content, likes, dislikes, approved, created_at";

const THREAD_VIEW_SELECT: &str = r#"
    SELECT
        t.id, t.category_id, c.name AS category, t.user_id, u.username,
        t.title, t.content, t.likes, t.dislikes, t.approved, t.created_at
    FROM threads t
    JOIN users u ON u.id = t.user_id
    JOIN categories c ON c.id = t.category_id
"#;

/// Submits a thread for review.
pub async fn create_thread(
    pool: &SqlitePool,
    identity: &Identity,
    payload: CreateThreadRequest,
) -> Result<Thread, AppError> {
    let author_id = identity.authorize(Capability::CreateThread)?;
    payload.validate()?;

    let title = clean_html(&payload.title);
    let content = clean_html(&payload.content);
    if title.is_empty() || content.is_empty() {
        return Err(AppError::BadRequest(
            "Title and content cannot be empty".to_string(),
        ));
    }

    let thread: Thread = sqlx::query_as(&format!(
        r#"
        INSERT INTO threads (category_id, user_id, title, content)
        SELECT ?1, ?2, ?3, ?4
        WHERE EXISTS (SELECT 1 FROM categories WHERE id = ?1)
        RETURNING {THREAD_COLUMNS}
        "#
    ))
    .bind(payload.category_id)
    .bind(author_id)
    .bind(&title)
    .bind(&content)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    tracing::info!(thread_id = thread.id, author_id, "thread submitted for review");
    Ok(thread)
}

/// Public listing: approved threads only, newest first.
pub async fn list_threads(
    pool: &SqlitePool,
    params: &ThreadListParams,
) -> Result<Vec<ThreadView>, AppError> {
    let threads = sqlx::query_as(&format!(
        "{THREAD_VIEW_SELECT} WHERE t.approved = 1 AND (?1 IS NULL OR t.category_id = ?1) ORDER BY t.id DESC"
    ))
    .bind(params.category_id)
    .fetch_all(pool)
    .await?;

    Ok(threads)
}

/// Moderation panel: threads waiting for review, oldest first.
pub async fn list_pending_threads(
    pool: &SqlitePool,
    identity: &Identity,
) -> Result<Vec<ThreadView>, AppError> {
    identity.authorize(Capability::ReviewThreads)?;

    let threads = sqlx::query_as(&format!(
        "{THREAD_VIEW_SELECT} WHERE t.approved = 0 ORDER BY t.id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(threads)
}

/// Thread page. Pending threads exist only for reviewers.
pub async fn get_thread(
    pool: &SqlitePool,
    identity: &Identity,
    id: i64,
) -> Result<ThreadDetail, AppError> {
    let thread: ThreadView = sqlx::query_as(&format!("{THREAD_VIEW_SELECT} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(|thread: &ThreadView| thread.approved || identity.can(Capability::ReviewThreads))
        .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

    let comments = comments::list_comments(pool, id).await?;

    Ok(ThreadDetail { thread, comments })
}

/// Makes a thread public. Approving an approved thread is a no-op.
pub async fn approve_thread(
    pool: &SqlitePool,
    identity: &Identity,
    id: i64,
) -> Result<Thread, AppError> {
    let reviewer_id = identity.authorize(Capability::ReviewThreads)?;

    let approved: Option<Thread> = sqlx::query_as(&format!(
        "UPDATE threads SET approved = 1 WHERE id = ? AND approved = 0 RETURNING {THREAD_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if let Some(thread) = approved {
        tracing::info!(thread_id = id, reviewer_id, "thread approved");
        return Ok(thread);
    }

    sqlx::query_as(&format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))
}

/// Rejects (deletes) a thread, pending or approved.
pub async fn reject_thread(pool: &SqlitePool, identity: &Identity, id: i64) -> Result<(), AppError> {
    let reviewer_id = identity.authorize(Capability::ReviewThreads)?;

    let mut tx = pool.begin().await?;
    if !remove_thread(&mut tx, id).await? {
        return Err(AppError::NotFound("Thread not found".to_string()));
    }
    tx.commit().await?;

    tracing::info!(thread_id = id, reviewer_id, "thread removed");
    Ok(())
}

/// Deletes a thread and everything referencing it. Meant to run inside the
/// caller's transaction. Returns `false` when the thread did not exist.
pub(crate) async fn remove_thread(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query(
        "DELETE FROM likes WHERE thread_id = ?1 OR comment_id IN (SELECT id FROM comments WHERE thread_id = ?1)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM comments WHERE thread_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM reports WHERE thread_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let deleted = sqlx::query("DELETE FROM threads WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(deleted.rows_affected() > 0)
}

/// Threads written by one user, any state, newest first.
pub(crate) async fn list_threads_by_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Thread>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {THREAD_COLUMNS} FROM threads WHERE user_id = ? ORDER BY id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
