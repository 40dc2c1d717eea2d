//! Moderator request workflow: `Pending -> Approved | Rejected`.
//!
//! Approval flips the request and promotes the applicant in one transaction.

use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        moderator_request::{
            CreateModeratorRequest, ModeratorRequest, PendingModeratorRequest, RequestStatus,
        },
        user::Role,
    },
    services::identity::{Capability, Identity},
};

const REQUEST_COLUMNS: &str = "id, user_id, reason, status, created_at";

/// Files a moderator request for the caller. One pending request per user.
pub async fn submit_request(
    pool: &SqlitePool,
    identity: &Identity,
    payload: CreateModeratorRequest,
) -> Result<ModeratorRequest, AppError> {
    let user_id = identity.authorize(Capability::RequestModerator)?;
    payload.validate()?;

    let mut conn = pool.acquire().await?;
    let request = insert_pending(&mut conn, user_id, &payload.reason).await?;

    tracing::info!(request_id = request.id, user_id, "moderator request submitted");
    Ok(request)
}

/// Inserts a pending request. Shared with registration, which files the
/// request in the same transaction as the account.
pub(crate) async fn insert_pending(
    conn: &mut SqliteConnection,
    user_id: i64,
    reason: &str,
) -> Result<ModeratorRequest, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Reason cannot be empty".to_string()));
    }

    sqlx::query_as(&format!(
        "INSERT INTO moderator_requests (user_id, reason) VALUES (?, ?) RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(user_id)
    .bind(reason)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You already have a pending moderator request".to_string())
        } else {
            AppError::from(e)
        }
    })
}

/// Admin panel: pending requests with the applicant's username.
pub async fn list_pending_requests(
    pool: &SqlitePool,
    identity: &Identity,
) -> Result<Vec<PendingModeratorRequest>, AppError> {
    identity.authorize(Capability::ManageModeratorRequests)?;

    let requests = sqlx::query_as(
        r#"
        SELECT r.id, r.user_id, u.username, r.reason, r.created_at
        FROM moderator_requests r
        JOIN users u ON u.id = r.user_id
        WHERE r.status = 'pending'
        ORDER BY r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// Approves a pending request and promotes the applicant. Both writes commit
/// together or not at all.
pub async fn approve_request(
    pool: &SqlitePool,
    identity: &Identity,
    request_id: i64,
) -> Result<ModeratorRequest, AppError> {
    let admin_id = identity.authorize(Capability::ManageModeratorRequests)?;

    let mut tx = pool.begin().await?;

    let request = close_pending(&mut tx, request_id, RequestStatus::Approved).await?;

    sqlx::query("UPDATE users SET role = ? WHERE id = ? AND role <> ?")
        .bind(Role::Moderator)
        .bind(request.user_id)
        .bind(Role::Admin)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(request_id, user_id = request.user_id, admin_id, "moderator request approved, user promoted");
    Ok(request)
}

/// Rejects a pending request. The applicant's role is untouched.
pub async fn reject_request(
    pool: &SqlitePool,
    identity: &Identity,
    request_id: i64,
) -> Result<ModeratorRequest, AppError> {
    let admin_id = identity.authorize(Capability::ManageModeratorRequests)?;

    let mut conn = pool.acquire().await?;
    let request = close_pending(&mut conn, request_id, RequestStatus::Rejected).await?;

    tracing::info!(request_id, user_id = request.user_id, admin_id, "moderator request rejected");
    Ok(request)
}

/// Moves a request out of `pending`. Terminal requests are a conflict.
async fn close_pending(
    conn: &mut SqliteConnection,
    request_id: i64,
    status: RequestStatus,
) -> Result<ModeratorRequest, AppError> {
    let closed: Option<ModeratorRequest> = sqlx::query_as(&format!(
        "UPDATE moderator_requests SET status = ? WHERE id = ? AND status = 'pending' RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(status)
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(request) = closed {
        return Ok(request);
    }

    let current: Option<RequestStatus> =
        sqlx::query_scalar("SELECT status FROM moderator_requests WHERE id = ?")
            .bind(request_id)
            .fetch_optional(&mut *conn)
            .await?;

    match current {
        None => Err(AppError::NotFound("Moderator request not found".to_string())),
        Some(current) => Err(AppError::Conflict(format!(
            "Moderator request is already {}",
            current.as_str()
        ))),
    }
}
