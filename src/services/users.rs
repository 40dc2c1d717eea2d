use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, LoginResponse, MeResponse, Role, User},
    services::{
        comments,
        identity::{Capability, Identity},
        moderator_requests, threads,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_session,
    },
};

const USER_COLUMNS: &str = "id, username, email, password, role, created_at";

/// Creates a `user` account, optionally filing a moderator request with it.
pub async fn register(pool: &SqlitePool, payload: CreateUserRequest) -> Result<User, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let mut tx = pool.begin().await?;

    let user: User = sqlx::query_as(&format!(
        "INSERT INTO users (username, email, password) VALUES (?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username or email already in use".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let moderator_reason = payload
        .moderator_reason
        .as_deref()
        .filter(|reason| !reason.trim().is_empty());
    if let Some(reason) = moderator_reason {
        moderator_requests::insert_pending(&mut tx, user.id, reason).await?;
    }

    tx.commit().await?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Verifies credentials and issues a session token.
pub async fn login(
    pool: &SqlitePool,
    config: &Config,
    payload: LoginRequest,
) -> Result<LoginResponse, AppError> {
    payload.validate()?;

    let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(&payload.username)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let token = sign_session(
        user.id,
        &user.username,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!(user_id = user.id, "login successful");
    Ok(LoginResponse {
        token,
        token_type: "Bearer",
        role: user.role,
    })
}

/// The caller's account with their threads (any state) and comments.
pub async fn profile(pool: &SqlitePool, identity: &Identity) -> Result<MeResponse, AppError> {
    let user_id = identity
        .user_id()
        .ok_or_else(|| AppError::AuthError("You must be logged in".to_string()))?;

    let user = find_user(pool, user_id).await?;
    let threads = threads::list_threads_by_user(pool, user_id).await?;
    let comments = comments::list_comments_by_user(pool, user_id).await?;

    Ok(MeResponse {
        user,
        threads,
        comments,
    })
}

pub async fn list_users(pool: &SqlitePool, identity: &Identity) -> Result<Vec<User>, AppError> {
    identity.authorize(Capability::ManageUsers)?;

    let users = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Promotes to moderator or demotes to user. Admin accounts, including the
/// caller's own, are out of reach.
pub async fn set_role(
    pool: &SqlitePool,
    identity: &Identity,
    user_id: i64,
    role: Role,
) -> Result<User, AppError> {
    let admin_id = identity.authorize(Capability::ManageUsers)?;

    if !matches!(role, Role::User | Role::Moderator) {
        return Err(AppError::BadRequest(format!("Cannot assign role '{role}'")));
    }
    if user_id == admin_id {
        return Err(AppError::BadRequest("Cannot change your own role".to_string()));
    }

    let target = find_user(pool, user_id).await?;
    if target.role == Role::Admin {
        return Err(AppError::BadRequest(
            "Cannot change the role of an admin".to_string(),
        ));
    }

    let user: User = sqlx::query_as(&format!(
        "UPDATE users SET role = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(role)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id, admin_id, from = %target.role, to = %role, "role changed");
    Ok(user)
}

/// Creates the admin account if no user with that name exists yet.
/// Returns whether an account was created.
pub async fn ensure_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<bool, AppError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let hashed_password = hash_password(password)?;

    sqlx::query("INSERT INTO users (username, email, password, role) VALUES (?, ?, ?, ?)")
        .bind(username)
        .bind(format!("{username}@admin.local"))
        .bind(&hashed_password)
        .bind(Role::Admin)
        .execute(pool)
        .await?;

    tracing::info!(username, "admin user seeded");
    Ok(true)
}

async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
