use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session: read-only access to published articles and the
/// entry points that create sessions. Pending submissions are never reachable here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- User Session Gateway ---
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        // Clears the cookie only; the token stays valid until it expires.
        .route("/api/auth/logout", post(handlers::logout))
        // --- Admin Session Gateway ---
        .route("/api/admin-login", post(handlers::admin_login))
        .route("/api/admin-logout", post(handlers::admin_logout))
        // GET /api/session
        // Idempotent "who am I" probe used by the site header.
        .route("/api/session", get(handlers::get_session))
        // --- Published Articles ---
        // GET /api/articles?category=...&subcategory=...
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/{id}", get(handlers::get_article))
        // GET /api/search?q=...
        .route("/api/search", get(handlers::search_articles))
        .route("/api/categories", get(handlers::get_categories))
        .route(
            "/api/categories/{category}/subcategories/{subcategory}/count",
            get(handlers::count_subcategory),
        )
}
