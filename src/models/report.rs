use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'reports' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub thread_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Report joined with its reporter and the reported thread (moderation panel).
#[derive(Debug, Serialize, FromRow)]
pub struct ReportView {
    pub id: i64,
    pub thread_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub reporter: String,
    pub title: String,
    pub content: String,
    pub approved: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[serde(default)]
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

/// Outcome of a report review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDecision {
    /// Dismiss the report; the thread stays.
    Approve,
    /// Uphold the report; the thread and everything hanging off it is removed.
    Reject,
}
