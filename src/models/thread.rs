use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::comment::Comment;

/// Represents the 'threads' table in the database.
/// `likes` and `dislikes` are owned by the vote ledger; nothing else writes them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub category_id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,

    /// `false` while pending review. Rejection deletes the row.
    pub approved: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A thread joined with its author and category for display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ThreadView {
    pub id: i64,
    pub category_id: i64,
    pub category: String,
    pub user_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,
    pub approved: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Thread page payload: the thread and its comments, oldest first.
#[derive(Debug, Serialize)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ThreadView,
    pub comments: Vec<Comment>,
}

/// DTO for creating a new thread.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    pub category_id: i64,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,
}

/// Query parameters for the public listing.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadListParams {
    pub category_id: Option<i64>,
}
