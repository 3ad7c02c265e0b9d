use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod slug;
pub mod storage;
pub mod workflow;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminSession, AuthUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::Credentials;
pub use repository::{CatalogRepository, RepositoryState};
pub use storage::{JsonFileStorage, MemoryStorage, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::login, handlers::logout, handlers::admin_login,
        handlers::admin_logout, handlers::get_session, handlers::list_articles,
        handlers::get_article, handlers::search_articles, handlers::get_categories,
        handlers::count_subcategory, handlers::submit_article, handlers::get_account,
        handlers::update_account, handlers::approve_article, handlers::reject_article,
        handlers::list_pending, handlers::get_pending, handlers::create_article,
        handlers::update_article, handlers::delete_article, handlers::list_users
    ),
    components(
        schemas(
            models::Article, models::PendingArticle, models::PendingStatus,
            models::ArticleInput, models::SignupRequest, models::LoginRequest,
            models::AdminLoginRequest, models::TagsInput, models::SubmitArticleRequest,
            models::ReviewRequest, models::UpdateAccountRequest, models::UserProfile,
            models::AuthResponse, models::MessageResponse, models::SubmitArticleResponse,
            models::ApproveArticleResponse, models::CategoryCount, models::CountResponse,
            models::SessionUser, models::SessionStatus, models::ErrorBody,
        )
    ),
    tags(
        (name = "catchpedia", description = "Catchpedia fishing wiki API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of shared services. Handlers and extractors pull
/// the parts they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Domain operations over users, articles and pending articles.
    pub repo: RepositoryState,
    /// Password hashing, token signing and cookie encoding.
    pub credentials: Credentials,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state, deriving the credential service from `config`.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            credentials: Credentials::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Credentials {
    fn from_ref(app_state: &AppState) -> Credentials {
        app_state.credentials.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gates the authenticated router. `AuthUser` rejects with 401 before the handler
/// runs when the user session cookie is missing or invalid.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Gates the admin router on the admin sentinel cookie.
async fn admin_middleware(_admin: AdminSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies scoped guards and global middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of one request shares its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
