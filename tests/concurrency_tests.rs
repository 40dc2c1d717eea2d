// tests/concurrency_tests.rs

mod common;

use common::{file_pool, insert_user, remove_file_pool};
use forum_backend::{
    error::AppError,
    models::{
        comment::CreateCommentRequest,
        report::{CreateReportRequest, ReportDecision},
        thread::CreateThreadRequest,
        user::Role,
    },
    services::{comments, identity::Identity, reports, threads},
};
use sqlx::SqlitePool;

async fn seed_thread(pool: &SqlitePool, author: i64) -> (i64, i64) {
    let category: i64 =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ('general') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let thread_id: i64 = sqlx::query_scalar(
        "INSERT INTO threads (category_id, user_id, title, content, approved) VALUES (?, ?, 't', 'c', 1) RETURNING id",
    )
    .bind(category)
    .bind(author)
    .fetch_one(pool)
    .await
    .unwrap();

    (category, thread_id)
}

async fn members(pool: &SqlitePool, count: usize) -> Vec<Identity> {
    let mut members = Vec::with_capacity(count);
    for i in 0..count {
        let name = format!("member{i}");
        let id = insert_user(pool, &name).await;
        members.push(Identity::member(id, name, Role::User));
    }
    members
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_writes_wait_for_the_lock() {
    let (pool, path) = file_pool().await;
    let author = insert_user(&pool, "author").await;
    let (category, thread_id) = seed_thread(&pool, author).await;
    let writers = members(&pool, 10).await;

    let mut handles = Vec::new();
    for (i, writer) in writers.iter().enumerate() {
        for round in 0..4 {
            let pool = pool.clone();
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                match round {
                    0 | 1 => comments::create_comment(
                        &pool,
                        &writer,
                        thread_id,
                        CreateCommentRequest {
                            content: format!("comment {i}/{round}"),
                        },
                    )
                    .await
                    .map(|_| ()),
                    2 => reports::file_report(
                        &pool,
                        &writer,
                        thread_id,
                        CreateReportRequest {
                            reason: format!("report {i}"),
                        },
                    )
                    .await
                    .map(|_| ()),
                    _ => threads::create_thread(
                        &pool,
                        &writer,
                        CreateThreadRequest {
                            category_id: category,
                            title: format!("thread {i}"),
                            content: "body".to_string(),
                        },
                    )
                    .await
                    .map(|_| ()),
                }
            }));
        }
    }

    for handle in handles {
        handle.await.unwrap().expect("concurrent write should succeed");
    }

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&pool)
        .await
        .unwrap();
    let reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(&pool)
        .await
        .unwrap();
    let threads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(comments, 20);
    assert_eq!(reports, 10);
    assert_eq!(threads, 11);

    remove_file_pool(pool, path).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_report_resolution_never_fails_internally() {
    let (pool, path) = file_pool().await;
    let author = insert_user(&pool, "author").await;
    let (_, thread_id) = seed_thread(&pool, author).await;
    let reporters = members(&pool, 8).await;

    let moderator_id = insert_user(&pool, "moderator").await;
    let moderator = Identity::member(moderator_id, "moderator", Role::Moderator);

    let mut report_ids = Vec::new();
    for reporter in &reporters {
        let report = reports::file_report(
            &pool,
            reporter,
            thread_id,
            CreateReportRequest {
                reason: "spam".to_string(),
            },
        )
        .await
        .unwrap();
        report_ids.push(report.id);
    }

    let mut handles = Vec::new();
    for (i, report_id) in report_ids.into_iter().enumerate() {
        let pool = pool.clone();
        let moderator = moderator.clone();
        let decision = if i % 2 == 0 {
            ReportDecision::Approve
        } else {
            ReportDecision::Reject
        };
        handles.push(tokio::spawn(async move {
            reports::resolve_report(&pool, &moderator, report_id, decision).await
        }));
    }

    for handle in handles {
        match handle.await.unwrap() {
            // A rejection already removed the thread and its other reports.
            Ok(()) | Err(AppError::NotFound(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(&pool)
        .await
        .unwrap();
    let thread: Option<i64> = sqlx::query_scalar("SELECT id FROM threads WHERE id = ?")
        .bind(thread_id)
        .fetch_optional(&pool)
        .await
        .unwrap();

    assert_eq!(remaining, 0);
    assert!(thread.is_none());

    remove_file_pool(pool, path).await;
}
