// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Default session lifetime: one day.
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Seeded at startup when both are set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("JWT_EXPIRATION must be a number of seconds, got '{raw}'"))?,
            Err(_) => DEFAULT_JWT_EXPIRATION,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("PORT must be a valid port number, got '{raw}'"))?,
            Err(_) => 3000,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}
