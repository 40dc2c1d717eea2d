use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::moderator_request::CreateModeratorRequest,
    services::{identity::Identity, moderator_requests, users},
};

/// Get the current user's profile with their threads and comments.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let me = users::profile(&pool, &identity).await?;

    Ok(Json(me))
}

/// Ask the admins for moderator status.
pub async fn request_moderator(
    State(pool): State<SqlitePool>,
    identity: Identity,
    Json(payload): Json<CreateModeratorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = moderator_requests::submit_request(&pool, &identity, payload).await?;

    Ok((StatusCode::CREATED, Json(request)))
}
