//! Report & review pipeline.
//!
//! Approving a report dismisses it (the row is removed, the thread stays).
//! Rejecting a report upholds it: the reported thread is removed with its
//! comments, votes and every report filed against it.

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::report::{CreateReportRequest, Report, ReportDecision, ReportView},
    services::{
        identity::{Capability, Identity},
        threads,
    },
};

/// Flags a thread for moderator review.
pub async fn file_report(
    pool: &SqlitePool,
    identity: &Identity,
    thread_id: i64,
    payload: CreateReportRequest,
) -> Result<Report, AppError> {
    let reporter_id = identity.authorize(Capability::FileReport)?;
    payload.validate()?;

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Reason cannot be empty".to_string()));
    }

    let report: Report = sqlx::query_as(
        r#"
        INSERT INTO reports (thread_id, user_id, reason)
        SELECT ?1, ?2, ?3
        WHERE EXISTS (SELECT 1 FROM threads WHERE id = ?1 AND (approved = 1 OR ?4))
        RETURNING id, thread_id, user_id, reason, created_at
        "#,
    )
    .bind(thread_id)
    .bind(reporter_id)
    .bind(reason)
    .bind(identity.can(Capability::ReviewThreads))
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

    tracing::info!(report_id = report.id, thread_id, reporter_id, "thread reported");
    Ok(report)
}

/// Open reports joined with reporter and thread. Inner joins drop any report
/// whose thread is gone instead of failing.
pub async fn list_reports(
    pool: &SqlitePool,
    identity: &Identity,
) -> Result<Vec<ReportView>, AppError> {
    identity.authorize(Capability::ResolveReports)?;

    let reports = sqlx::query_as(
        r#"
        SELECT
            r.id, r.thread_id, r.user_id, r.reason, u.username AS reporter,
            t.title, t.content, t.approved, r.created_at
        FROM reports r
        INNER JOIN users u ON u.id = r.user_id
        INNER JOIN threads t ON t.id = r.thread_id
        ORDER BY r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(reports)
}

pub async fn resolve_report(
    pool: &SqlitePool,
    identity: &Identity,
    report_id: i64,
    decision: ReportDecision,
) -> Result<(), AppError> {
    let reviewer_id = identity.authorize(Capability::ResolveReports)?;

    let mut tx = pool.begin().await?;

    // Both decisions close the report, so dropping it comes first and takes
    // the write lock for the rest of the transaction.
    let thread_id: i64 = sqlx::query_scalar("DELETE FROM reports WHERE id = ? RETURNING thread_id")
        .bind(report_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

    if decision == ReportDecision::Reject {
        threads::remove_thread(&mut tx, thread_id).await?;
    }

    tx.commit().await?;

    tracing::info!(report_id, thread_id, reviewer_id, ?decision, "report resolved");
    Ok(())
}
