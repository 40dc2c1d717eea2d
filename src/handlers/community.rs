use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::thread::{CreateThreadRequest, ThreadListParams},
    services::{categories, identity::Identity, threads},
};

/// Submit a new thread. It stays hidden until a moderator approves it.
/// Requires: user or moderator.
pub async fn create_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let thread = threads::create_thread(&pool, &identity, payload).await?;

    Ok((StatusCode::CREATED, Json(thread)))
}

/// List approved threads, optionally within one category.
pub async fn list_threads(
    State(pool): State<SqlitePool>,
    Query(params): Query<ThreadListParams>,
) -> Result<impl IntoResponse, AppError> {
    let threads = threads::list_threads(&pool, &params).await?;

    Ok(Json(threads))
}

/// Get a single thread with its comments.
pub async fn get_thread(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let thread = threads::get_thread(&pool, &identity, id).await?;

    Ok(Json(thread))
}

pub async fn list_categories(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let categories = categories::list_categories(&pool).await?;

    Ok(Json(categories))
}
