use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentflow_api::background::BackgroundServices;
use contentflow_api::config::ServerConfig;
use contentflow_api::router::build_app_router;
use contentflow_api::state::AppState;
use contentflow_db::store::PgStore;
use contentflow_events::EventBus;

const DEFAULT_LOG_FILTER: &str = "contentflow_api=debug,contentflow_content=debug,contentflow_events=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        scheduler_interval_secs = config.scheduler_interval_secs,
        webhook_max_concurrency = config.webhook_max_concurrency,
        "Loaded server configuration"
    );

    let store = Arc::new(connect_store(&config).await);
    let event_bus = Arc::new(EventBus::default());

    // Background tasks subscribe before the router can publish anything.
    let background = BackgroundServices::start(Arc::clone(&store), &event_bus, &config)
        .expect("Failed to start background services");

    let state = AppState::new(store, config.clone(), Arc::clone(&event_bus));
    let app = build_app_router(state, &config);

    let host = config.host.parse().expect("Invalid HOST address");
    let addr = SocketAddr::new(host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "ContentFlow API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("HTTP server stopped, stopping background services");
    background
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify and migrate the database. Any failure aborts startup.
async fn connect_store(config: &ServerConfig) -> PgStore {
    let pool = contentflow_db::create_pool(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_acquire_timeout_secs),
    )
    .await
    .expect("Failed to connect to database");

    contentflow_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    contentflow_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!(
        max_connections = config.database_max_connections,
        "Database ready"
    );

    PgStore::new(pool)
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutdown signal received");
}
