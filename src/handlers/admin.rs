// src/handlers/admin.rs
// Admin panel: users, moderator requests and categories. Admin only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{category::CreateCategoryRequest, user::Role},
    services::{categories, identity::Identity, moderator_requests, users},
};

/// Lists all users in the system.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let users = users::list_users(&pool, &identity).await?;

    Ok(Json(users))
}

/// Grants the moderator role directly, without a request.
pub async fn promote_user(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::set_role(&pool, &identity, id, Role::Moderator).await?;

    Ok(Json(user))
}

/// Takes the moderator role away.
pub async fn demote_user(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::set_role(&pool, &identity, id, Role::User).await?;

    Ok(Json(user))
}

pub async fn list_moderator_requests(
    State(pool): State<SqlitePool>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let requests = moderator_requests::list_pending_requests(&pool, &identity).await?;

    Ok(Json(requests))
}

/// Approves the request and promotes the applicant atomically.
pub async fn approve_moderator_request(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let request = moderator_requests::approve_request(&pool, &identity, id).await?;

    Ok(Json(request))
}

pub async fn reject_moderator_request(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let request = moderator_requests::reject_request(&pool, &identity, id).await?;

    Ok(Json(request))
}

pub async fn create_category(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = categories::create_category(&pool, &identity, payload).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Deletes a category. Refused while threads still reference it.
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    categories::delete_category(&pool, &identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
