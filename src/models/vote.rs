use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// What a ledger row points at. Threads and comments keep separate ledgers
/// inside the same `likes` table, one nullable column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Thread(i64),
    Comment(i64),
}

impl VoteTarget {
    pub fn id(&self) -> i64 {
        match self {
            VoteTarget::Thread(id) | VoteTarget::Comment(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Thread(_) => "thread",
            VoteTarget::Comment(_) => "comment",
        }
    }

    /// Table holding the denormalized counters.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            VoteTarget::Thread(_) => "threads",
            VoteTarget::Comment(_) => "comments",
        }
    }

    /// Ledger column referencing the target.
    pub(crate) fn ledger_column(&self) -> &'static str {
        match self {
            VoteTarget::Thread(_) => "thread_id",
            VoteTarget::Comment(_) => "comment_id",
        }
    }
}

/// A single vote: +1 (like) or -1 (dislike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Like,
    Dislike,
}

impl VoteStatus {
    pub fn value(&self) -> i64 {
        match self {
            VoteStatus::Like => 1,
            VoteStatus::Dislike => -1,
        }
    }

    /// Counter column bumped by a vote of this status.
    pub(crate) fn counter_column(&self) -> &'static str {
        match self {
            VoteStatus::Like => "likes",
            VoteStatus::Dislike => "dislikes",
        }
    }

    pub fn opposite(&self) -> VoteStatus {
        match self {
            VoteStatus::Like => VoteStatus::Dislike,
            VoteStatus::Dislike => VoteStatus::Like,
        }
    }
}

impl TryFrom<i64> for VoteStatus {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteStatus::Like),
            -1 => Ok(VoteStatus::Dislike),
            _ => Err(AppError::BadRequest(
                "Vote status must be 1 or -1".to_string(),
            )),
        }
    }
}

/// DTO for casting a vote. `status` is 1 for like, -1 for dislike.
/// Any JSON value is accepted here so that a wrong type is rejected by the
/// ledger with the same 400 as a wrong number.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub status: Option<Value>,
}

impl VoteRequest {
    /// The requested status as an integer. Missing or non-integer values
    /// map to 0, which is not a vote.
    pub fn desired(&self) -> i64 {
        self.status.as_ref().and_then(Value::as_i64).unwrap_or(0)
    }
}

/// Counters of the target after a vote was applied.
#[derive(Debug, Clone, Serialize)]
pub struct VoteTally {
    pub target: &'static str,
    pub target_id: i64,
    pub likes: i64,
    pub dislikes: i64,
    /// The caller's current vote on the target.
    pub status: VoteStatus,
    /// `false` when the vote repeated the caller's existing one.
    pub changed: bool,
}
