// tests/common/mod.rs
#![allow(dead_code)]

use std::{path::PathBuf, str::FromStr, time::Duration};

use forum_backend::{
    config::Config, routes, services::users::ensure_admin, state::AppState,
};
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// A user registered and logged in through the API.
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Fresh in-memory database with the schema applied.
///
/// A single connection that never expires: every connection to
/// `sqlite::memory:` would otherwise get its own empty database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// File-backed database opened the way `main.rs` opens it, so several
/// connections write concurrently and contend for the write lock.
pub async fn file_pool() -> (SqlitePool, PathBuf) {
    let path = std::env::temp_dir().join(format!("forum-test-{}.db", uuid::Uuid::new_v4()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open SQLite file");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    (pool, path)
}

pub async fn remove_file_pool(pool: SqlitePool, path: PathBuf) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

/// Inserts a plain user straight into the store.
pub async fn insert_user(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (username, email, password) VALUES (?, ?, 'x') RETURNING id",
    )
    .bind(name)
    .bind(format!("{name}@example.com"))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        admin_username: None,
        admin_password: None,
    }
}

/// Spawns the app on a random port. Returns the base URL and the pool
/// backing it so tests can inspect the store directly.
pub async fn spawn_app() -> TestApp {
    let pool = memory_pool().await;

    let state = AppState {
        pool: pool.clone(),
        config: test_config(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200, "login failed for {username}");

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    /// Registers a plain user and logs them in.
    pub async fn register_user(&self, prefix: &str) -> TestUser {
        let username = unique_name(prefix);
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123"
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        let id = body["id"].as_i64().expect("user id");
        let token = self.login(&username, "password123").await;

        TestUser {
            id,
            username,
            token,
        }
    }

    /// Registers a user and gives them the moderator role directly in the store.
    pub async fn register_moderator(&self, prefix: &str) -> TestUser {
        let user = self.register_user(prefix).await;
        sqlx::query("UPDATE users SET role = 'moderator' WHERE id = ?")
            .bind(user.id)
            .execute(&self.pool)
            .await
            .unwrap();
        user
    }

    pub async fn admin(&self) -> TestUser {
        let username = unique_name("admin");
        ensure_admin(&self.pool, &username, "admin-password")
            .await
            .expect("seed admin");
        let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        let token = self.login(&username, "admin-password").await;

        TestUser {
            id,
            username,
            token,
        }
    }

    pub async fn category(&self, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO categories (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Creates a thread through the API as `author`, returning its id.
    pub async fn create_thread(&self, author: &TestUser, category_id: i64, title: &str) -> i64 {
        let response = self
            .post(
                "/api/threads",
                Some(&author.token),
                json!({
                    "category_id": category_id,
                    "title": title,
                    "content": "Some content"
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().expect("thread id")
    }

    /// Creates a thread and approves it through the moderation API.
    pub async fn approved_thread(&self, author: &TestUser, reviewer: &TestUser, title: &str) -> i64 {
        let category_id = self.category(&unique_name("cat")).await;
        let thread_id = self.create_thread(author, category_id, title).await;

        let response = self
            .post(
                &format!("/api/moderation/threads/{}/approve", thread_id),
                Some(&reviewer.token),
                json!({}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);

        thread_id
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(&self.pool).await.unwrap()
    }
}
