// Moderator panel: thread review and report resolution.
// Moderators and admins only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::report::ReportDecision,
    services::{identity::Identity, reports, threads},
};

pub async fn list_pending_threads(
    State(pool): State<SqlitePool>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let threads = threads::list_pending_threads(&pool, &identity).await?;

    Ok(Json(threads))
}

pub async fn approve_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let thread = threads::approve_thread(&pool, &identity, id).await?;

    Ok(Json(thread))
}

/// Rejecting deletes the thread with its comments, votes and reports.
pub async fn reject_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    threads::reject_thread(&pool, &identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_reports(
    State(pool): State<SqlitePool>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let reports = reports::list_reports(&pool, &identity).await?;

    Ok(Json(reports))
}

/// Dismiss a report; the thread stays.
pub async fn approve_report(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    reports::resolve_report(&pool, &identity, id, ReportDecision::Approve).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Uphold a report by deleting the reported thread.
pub async fn reject_report(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    reports::resolve_report(&pool, &identity, id, ReportDecision::Reject).await?;

    Ok(StatusCode::NO_CONTENT)
}
