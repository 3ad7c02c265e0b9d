use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for signed-in community members. The whole router sits behind
/// `auth_middleware`, and each handler also takes `AuthUser`, so the author
/// identity always comes from the verified session token.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/submit-article
        // Queues a submission in `pending` for admin review.
        .route("/api/submit-article", post(handlers::submit_article))
        // GET/PUT /api/account
        // The caller's own profile; PUT re-issues the session cookie.
        .route(
            "/api/account",
            get(handlers::get_account).put(handlers::update_account),
        )
}
