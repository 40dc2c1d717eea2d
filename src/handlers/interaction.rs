use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        comment::CreateCommentRequest,
        report::CreateReportRequest,
        vote::{VoteRequest, VoteTarget},
    },
    services::{comments, identity::Identity, reports, votes},
};

/// Like (1) or dislike (-1) a thread.
pub async fn vote_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(thread_id): Path<i64>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tally = votes::apply_vote(
        &pool,
        &identity,
        VoteTarget::Thread(thread_id),
        payload.desired(),
    )
    .await?;

    Ok(Json(tally))
}

/// Like (1) or dislike (-1) a comment.
pub async fn vote_comment(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(comment_id): Path<i64>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tally = votes::apply_vote(
        &pool,
        &identity,
        VoteTarget::Comment(comment_id),
        payload.desired(),
    )
    .await?;

    Ok(Json(tally))
}

/// Create a new comment on a thread.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(thread_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments::create_comment(&pool, &identity, thread_id, payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Report a thread to the moderators.
pub async fn report_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(thread_id): Path<i64>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = reports::file_report(&pool, &identity, thread_id, payload).await?;

    Ok((StatusCode::CREATED, Json(report)))
}
