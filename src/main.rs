use catchpedia::{
    AppState, CatalogRepository, JsonFileStorage, MemoryStorage,
    config::{AppConfig, Env, StorageBackend},
    create_router,
    repository::RepositoryState,
    storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: configuration, logging, persistence, then the
/// HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();

    // 2. Logging Filter Setup
    // RUST_LOG takes priority over the development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catchpedia=debug,tower_http=info".into());

    // APP_ENV is peeked here so the subscriber exists before AppConfig::load logs
    // any fallback warnings.
    let production = std::env::var("APP_ENV").as_deref() == Ok("production");
    if production {
        // PROD: JSON lines for log aggregation.
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    let config = AppConfig::load();
    tracing::info!("Application starting in {:?} mode", config.env);
    if config.env == Env::Local {
        tracing::warn!("admin session uses a plain sentinel cookie; do not expose a local build");
    }

    // 3. Storage Initialization
    let storage: StorageState = match config.storage_backend {
        StorageBackend::File => {
            tracing::info!(path = %config.data_path.display(), "using JSON file storage");
            Arc::new(JsonFileStorage::new(config.data_path.clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    let repo = CatalogRepository::open(storage)
        .await
        .expect("FATAL: Failed to load the catalog. Check DATA_PATH.");
    let repo = Arc::new(repo) as RepositoryState;

    // 4. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, config));

    // 5. Server Startup
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly");
}
