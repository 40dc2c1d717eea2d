//! Voting ledger.
//!
//! One `likes` row per (target, voter). The `likes`/`dislikes` columns on
//! threads and comments are denormalized aggregates of that ledger and are
//! only ever changed here, inside the same transaction as the ledger row.

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::{AppError, is_unique_violation},
    models::vote::{VoteStatus, VoteTally, VoteTarget},
    services::identity::{Capability, Identity},
};

/// A lost insert race is retried this many times in total before the vote
/// is treated as already applied.
const MAX_VOTE_ATTEMPTS: u32 = 2;

/// Records `desired` (1 or -1) as the caller's vote on `target`.
///
/// * no previous vote: insert the row, bump the matching counter
/// * same vote again: no-op
/// * opposite vote: flip the row in place, move one from the old counter to the new one
///
/// On success the target's counters equal the ledger's per-status row counts.
pub async fn apply_vote(
    pool: &SqlitePool,
    identity: &Identity,
    target: VoteTarget,
    desired: i64,
) -> Result<VoteTally, AppError> {
    let voter_id = identity.authorize(Capability::Vote)?;
    let desired = VoteStatus::try_from(desired)?;
    let see_pending = identity.can(Capability::ReviewThreads);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match apply_vote_once(pool, voter_id, target, desired, see_pending).await {
            Err(AppError::Conflict(_)) if attempt < MAX_VOTE_ATTEMPTS => {
                tracing::debug!(voter_id, target = target.kind(), target_id = target.id(), attempt, "vote insert lost a race, retrying");
            }
            Err(AppError::Conflict(_)) => return settled_tally(pool, voter_id, target, desired).await,
            result => return result,
        }
    }
}

async fn apply_vote_once(
    pool: &SqlitePool,
    voter_id: i64,
    target: VoteTarget,
    desired: VoteStatus,
    see_pending: bool,
) -> Result<VoteTally, AppError> {
    let mut tx = pool.begin().await?;

    // Writing to the target first takes the database write lock, so the
    // lookup below cannot race another vote. It also checks existence.
    let touched = sqlx::query(&lock_target_sql(target, see_pending))
        .bind(target.id())
        .execute(&mut *tx)
        .await?;

    if touched.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} {} not found",
            target.kind(),
            target.id()
        )));
    }

    let existing: Option<(i64, i64)> = sqlx::query_as(&format!(
        "SELECT id, like_status FROM likes WHERE {} = ? AND user_id = ?",
        target.ledger_column()
    ))
    .bind(target.id())
    .bind(voter_id)
    .fetch_optional(&mut *tx)
    .await?;

    let changed = match existing {
        None => {
            sqlx::query(&format!(
                "INSERT INTO likes ({}, user_id, like_status) VALUES (?, ?, ?)",
                target.ledger_column()
            ))
            .bind(target.id())
            .bind(voter_id)
            .bind(desired.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Vote already recorded".to_string())
                } else {
                    AppError::from(e)
                }
            })?;

            bump_counters(&mut tx, target, Some(desired), None).await?;
            true
        }
        Some((_, status)) if status == desired.value() => false,
        Some((row_id, _)) => {
            sqlx::query("UPDATE likes SET like_status = ? WHERE id = ?")
                .bind(desired.value())
                .bind(row_id)
                .execute(&mut *tx)
                .await?;

            bump_counters(&mut tx, target, Some(desired), Some(desired.opposite())).await?;
            true
        }
    };

    let (likes, dislikes) = read_counters(&mut tx, target).await?;

    tx.commit().await?;

    if changed {
        tracing::debug!(voter_id, target = target.kind(), target_id = target.id(), status = ?desired, likes, dislikes, "vote applied");
    }

    Ok(VoteTally {
        target: target.kind(),
        target_id: target.id(),
        likes,
        dislikes,
        status: desired,
        changed,
    })
}

/// No-op write used as lock + existence check. Threads still pending review
/// (or comments under them) only count as existing for reviewers.
fn lock_target_sql(target: VoteTarget, see_pending: bool) -> String {
    let visibility = match (target, see_pending) {
        (_, true) => "",
        (VoteTarget::Thread(_), false) => " AND approved = 1",
        (VoteTarget::Comment(_), false) => {
            " AND thread_id IN (SELECT id FROM threads WHERE approved = 1)"
        }
    };

    format!(
        "UPDATE {} SET likes = likes WHERE id = ?{}",
        target.table(),
        visibility
    )
}

async fn bump_counters(
    conn: &mut SqliteConnection,
    target: VoteTarget,
    increment: Option<VoteStatus>,
    decrement: Option<VoteStatus>,
) -> Result<(), sqlx::Error> {
    let mut assignments = Vec::with_capacity(2);
    if let Some(status) = increment {
        let column = status.counter_column();
        assignments.push(format!("{column} = {column} + 1"));
    }
    if let Some(status) = decrement {
        let column = status.counter_column();
        assignments.push(format!("{column} = {column} - 1"));
    }

    sqlx::query(&format!(
        "UPDATE {} SET {} WHERE id = ?",
        target.table(),
        assignments.join(", ")
    ))
    .bind(target.id())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn read_counters(
    conn: &mut SqliteConnection,
    target: VoteTarget,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT likes, dislikes FROM {} WHERE id = ?",
        target.table()
    ))
    .bind(target.id())
    .fetch_one(&mut *conn)
    .await
}

/// Tally after a vote whose insert kept losing races: someone else's
/// transaction already wrote the caller's row, so report what is stored.
async fn settled_tally(
    pool: &SqlitePool,
    voter_id: i64,
    target: VoteTarget,
    desired: VoteStatus,
) -> Result<VoteTally, AppError> {
    let mut conn = pool.acquire().await?;
    let (likes, dislikes) = read_counters(&mut conn, target).await?;

    let stored: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT like_status FROM likes WHERE {} = ? AND user_id = ?",
        target.ledger_column()
    ))
    .bind(target.id())
    .bind(voter_id)
    .fetch_optional(&mut *conn)
    .await?;

    tracing::warn!(voter_id, target = target.kind(), target_id = target.id(), "vote treated as already applied after repeated conflicts");

    Ok(VoteTally {
        target: target.kind(),
        target_id: target.id(),
        likes,
        dislikes,
        status: stored
            .and_then(|value| VoteStatus::try_from(value).ok())
            .unwrap_or(desired),
        changed: false,
    })
}

/// Likes and dislikes recomputed from the ledger alone, for auditing the
/// denormalized counters.
pub async fn ledger_totals(pool: &SqlitePool, target: VoteTarget) -> Result<(i64, i64), AppError> {
    let (likes, dislikes): (i64, i64) = sqlx::query_as(&format!(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN like_status = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN like_status = -1 THEN 1 ELSE 0 END), 0)
        FROM likes
        WHERE {} = ?
        "#,
        target.ledger_column()
    ))
    .bind(target.id())
    .fetch_one(pool)
    .await?;

    Ok((likes, dislikes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_statement_hides_pending_threads_from_members() {
        assert_eq!(
            lock_target_sql(VoteTarget::Thread(1), false),
            "UPDATE threads SET likes = likes WHERE id = ? AND approved = 1"
        );
        assert_eq!(
            lock_target_sql(VoteTarget::Thread(1), true),
            "UPDATE threads SET likes = likes WHERE id = ?"
        );
        assert!(lock_target_sql(VoteTarget::Comment(1), false).starts_with("UPDATE comments"));
    }
}
