use insurai_portal::{
    AppState,
    api::{ApiState, BackendClient},
    config::{AppConfig, Env},
    create_router,
    session::SessionStore,
    storage::{FileStorage, StorageState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, session rehydration, backend client and
/// the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for the portal itself.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "insurai_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    // 3. Session rehydration. Runs exactly once, before any navigation is served.
    let storage = Arc::new(FileStorage::new(&config.session_file)) as StorageState;
    let session = Arc::new(SessionStore::initialize(storage));
    tracing::info!(file = %config.session_file.display(), "session store ready");

    // 4. Backend API client
    let api = Arc::new(
        BackendClient::new(&config.api_base_url)
            .expect("FATAL: Failed to build the backend HTTP client."),
    ) as ApiState;
    tracing::info!(base_url = %config.api_base_url, "backend API client configured");

    // 5. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(session, api, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the portal listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: Portal server terminated unexpectedly.");
}
