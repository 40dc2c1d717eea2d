// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest},
    services::users,
};

/// Registers a new user.
///
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::register(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a bearer session token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = users::login(&pool, &config, payload).await?;

    Ok(Json(session))
}
