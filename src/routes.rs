// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, community, interaction, moderation, profile},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, threads, comments, moderation, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool + config).
///
/// Role checks live in the services, so every route accepts guests at the
/// routing level and the service answers 401/403.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let thread_routes = Router::new()
        .route("/", get(community::list_threads).post(community::create_thread))
        .route("/{id}", get(community::get_thread))
        .route("/{id}/comments", post(interaction::create_comment))
        .route("/{id}/vote", post(interaction::vote_thread))
        .route("/{id}/reports", post(interaction::report_thread));

    let comment_routes = Router::new().route("/{id}/vote", post(interaction::vote_comment));

    let me_routes = Router::new()
        .route("/", get(profile::get_me))
        .route("/moderator-request", post(profile::request_moderator));

    let moderation_routes = Router::new()
        .route("/threads", get(moderation::list_pending_threads))
        .route("/threads/{id}/approve", post(moderation::approve_thread))
        .route("/threads/{id}/reject", post(moderation::reject_thread))
        .route("/reports", get(moderation::list_reports))
        .route("/reports/{id}/approve", post(moderation::approve_report))
        .route("/reports/{id}/reject", post(moderation::reject_report));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/promote", post(admin::promote_user))
        .route("/users/{id}/demote", post(admin::demote_user))
        .route("/moderator-requests", get(admin::list_moderator_requests))
        .route(
            "/moderator-requests/{id}/approve",
            post(admin::approve_moderator_request),
        )
        .route(
            "/moderator-requests/{id}/reject",
            post(admin::reject_moderator_request),
        )
        .route("/categories", post(admin::create_category))
        .route("/categories/{id}", delete(admin::delete_category));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/categories", get(community::list_categories))
        .nest("/api/threads", thread_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/me", me_routes)
        .nest("/api/moderation", moderation_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
