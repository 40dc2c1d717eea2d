// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::Role,
    services::identity::{self, Identity},
    state::AppState,
};

/// Current layout of the session payload. Tokens carrying another version are rejected.
pub const SESSION_VERSION: u8 = 1;

/// Session payload carried in the bearer token.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Payload layout version.
    pub ver: u8,
    /// Subject - the user id (as string).
    pub sub: String,
    pub username: String,
    /// Role at login time. Informational: the stored role wins on resolution.
    #[serde(default)]
    pub role: Option<Role>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a session token for the user.
pub fn sign_session(
    id: i64,
    username: &str,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = SessionClaims {
        ver: SESSION_VERSION,
        sub: id.to_string(),
        username: username.to_owned(),
        role: Some(role),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a session token.
pub fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, AppError> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    if token_data.claims.ver != SESSION_VERSION {
        return Err(AppError::AuthError("Unsupported session version".to_string()));
    }

    Ok(token_data.claims)
}

/// Resolves the caller from the `Authorization: Bearer <token>` header.
///
/// No header means a guest. A header that does not carry a valid session is
/// rejected with 401 instead of silently downgrading to guest.
impl<S> FromRequestParts<S> for Identity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Identity::guest());
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Malformed authorization header".to_string()))?;

        let state = AppState::from_ref(state);
        let claims = verify_session(token, &state.config.jwt_secret)?;

        identity::resolve(&state.pool, &claims).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trip() {
        let token = sign_session(7, "alice", Role::Moderator, "secret", 60).unwrap();
        let claims = verify_session(&token, "secret").unwrap();

        assert_eq!(claims.ver, SESSION_VERSION);
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Some(Role::Moderator));
    }

    #[test]
    fn rejects_foreign_signatures() {
        let token = sign_session(7, "alice", Role::User, "secret", 60).unwrap();
        assert!(matches!(
            verify_session(&token, "other-secret"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn rejects_other_payload_versions() {
        let claims = SessionClaims {
            ver: SESSION_VERSION + 1,
            sub: "7".to_string(),
            username: "alice".to_string(),
            role: None,
            exp: usize::MAX / 2,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            verify_session(&token, "secret"),
            Err(AppError::AuthError(_))
        ));
    }
}
