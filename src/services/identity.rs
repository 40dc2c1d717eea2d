//! Identity & role resolution.
//!
//! Authorization is a capability lookup per action rather than a rank
//! comparison: moderators and admins hold disjoint special powers.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::Role, utils::jwt::SessionClaims};

/// Actions guarded by a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateThread,
    CreateComment,
    Vote,
    FileReport,
    RequestModerator,
    /// Approve/reject pending threads and see them in the moderation panel.
    ReviewThreads,
    ResolveReports,
    ManageModeratorRequests,
    ManageUsers,
    ManageCategories,
}

impl Capability {
    pub fn granted_to(self, role: Role) -> bool {
        use Capability::*;

        match (self, role) {
            (CreateThread | CreateComment | Vote | FileReport, Role::User | Role::Moderator) => true,
            (RequestModerator, Role::User) => true,
            (ReviewThreads | ResolveReports, Role::Moderator | Role::Admin) => true,
            (ManageModeratorRequests | ManageUsers | ManageCategories, Role::Admin) => true,
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Capability::CreateThread => "create threads",
            Capability::CreateComment => "comment",
            Capability::Vote => "vote",
            Capability::FileReport => "report threads",
            Capability::RequestModerator => "request moderator status",
            Capability::ReviewThreads => "review threads",
            Capability::ResolveReports => "resolve reports",
            Capability::ManageModeratorRequests => "manage moderator requests",
            Capability::ManageUsers => "manage users",
            Capability::ManageCategories => "manage categories",
        }
    }
}

/// Who is making the request. Anonymous callers are guests with no user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    user_id: Option<i64>,
    username: Option<String>,
    role: Role,
}

impl Identity {
    pub fn guest() -> Self {
        Self {
            user_id: None,
            username: None,
            role: Role::Guest,
        }
    }

    pub fn member(user_id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.into()),
            role,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.is_authenticated() && capability.granted_to(self.role)
    }

    /// Checks the capability and returns the caller's user id.
    /// Guests get `AuthError`, members with the wrong role get `Forbidden`.
    pub fn authorize(&self, capability: Capability) -> Result<i64, AppError> {
        match self.user_id {
            None => Err(AppError::AuthError(format!(
                "You must be logged in to {}",
                capability.describe()
            ))),
            Some(id) if capability.granted_to(self.role) => Ok(id),
            Some(_) => Err(AppError::Forbidden(format!(
                "Role '{}' is not allowed to {}",
                self.role,
                capability.describe()
            ))),
        }
    }
}

/// Turns verified session claims into an identity, re-reading the role from
/// the store so promotions and demotions apply on the next request.
pub async fn resolve(pool: &SqlitePool, claims: &SessionClaims) -> Result<Identity, AppError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    let (username, role): (String, Role) =
        sqlx::query_as("SELECT username, role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Session user no longer exists".to_string()))?;

    if claims.role.is_some_and(|claimed| claimed != role) {
        tracing::debug!(user_id, claimed = ?claims.role, %role, "role changed since login");
    }

    Ok(Identity::member(user_id, username, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderators_cannot_use_admin_powers() {
        let moderator = Identity::member(2, "mod", Role::Moderator);
        for capability in [
            Capability::ManageModeratorRequests,
            Capability::ManageUsers,
            Capability::ManageCategories,
        ] {
            assert!(matches!(
                moderator.authorize(capability),
                Err(AppError::Forbidden(_))
            ));
        }
        assert_eq!(moderator.authorize(Capability::ResolveReports).ok(), Some(2));
    }

    #[test]
    fn admins_do_not_inherit_member_actions() {
        let admin = Identity::member(1, "root", Role::Admin);
        assert!(admin.can(Capability::ReviewThreads));
        assert!(admin.can(Capability::ManageCategories));
        assert!(!admin.can(Capability::CreateThread));
        assert!(!admin.can(Capability::RequestModerator));
    }

    #[test]
    fn guests_are_unauthorized_everywhere() {
        let guest = Identity::guest();
        assert!(!guest.is_authenticated());
        for capability in [
            Capability::CreateThread,
            Capability::Vote,
            Capability::ReviewThreads,
            Capability::ManageUsers,
        ] {
            assert!(matches!(
                guest.authorize(capability),
                Err(AppError::AuthError(_))
            ));
        }
    }

    #[test]
    fn only_plain_users_request_moderator_status() {
        assert!(Capability::RequestModerator.granted_to(Role::User));
        assert!(!Capability::RequestModerator.granted_to(Role::Moderator));
        assert!(!Capability::RequestModerator.granted_to(Role::Admin));
    }
}
