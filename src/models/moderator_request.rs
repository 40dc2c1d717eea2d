use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Lifecycle of a moderator request. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Represents the 'moderator_requests' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ModeratorRequest {
    pub id: i64,
    pub user_id: i64,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Pending request joined with the applicant's username (admin panel).
#[derive(Debug, Serialize, FromRow)]
pub struct PendingModeratorRequest {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub reason: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateModeratorRequest {
    #[serde(default)]
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}
