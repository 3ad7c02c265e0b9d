use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Moderation and authoring endpoints for the single shared admin. The router is
/// wrapped in `admin_middleware`; any request without the admin cookie gets a 401
/// before reaching a handler.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Review Workflow ---
        // POST /api/approve-article
        // pending -> approved, and publishes a new article in the same commit.
        .route("/api/approve-article", post(handlers::approve_article))
        // POST /api/reject-article
        // pending -> rejected. Both outcomes are terminal.
        .route("/api/reject-article", post(handlers::reject_article))
        // GET /api/admin/pending?status=...
        .route("/api/admin/pending", get(handlers::list_pending))
        .route("/api/admin/pending/{id}", get(handlers::get_pending))
        // --- Article Authoring ---
        .route("/api/admin/articles", post(handlers::create_article))
        .route(
            "/api/admin/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        // --- Accounts ---
        .route("/api/admin/users", get(handlers::list_users))
}
