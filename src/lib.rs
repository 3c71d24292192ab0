//! Interior Studio Backend - lead intake, newsletter and admin dashboard API

pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod validation;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use db::{DbConfig, MongoStore, StoreError};
use logging::config::LogConfig;
use state::AppState;

/// Largest accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Fatal errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database setup failed: {0}")]
    Database(#[from] StoreError),

    #[error("invalid bind address {0}")]
    Address(String),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, falling back to
/// the local Next.js dev server.
pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(
            std::env::var("ALLOWED_ORIGINS").ok().as_deref(),
            std::env::var("FRONTEND_ORIGIN").ok().as_deref(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn allowed_origins(allowed: Option<&str>, frontend: Option<&str>) -> Vec<HeaderValue> {
    let parse_list = |s: &str| -> Vec<HeaderValue> {
        s.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| origin.parse().ok())
            .collect()
    };

    let origins = allowed.map(parse_list).unwrap_or_default();
    if !origins.is_empty() {
        return origins;
    }

    let origins = frontend.map(parse_list).unwrap_or_default();
    if !origins.is_empty() {
        return origins;
    }

    vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ]
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route(
            "/api/contacts",
            get(routes::contacts::list_contacts)
                .post(routes::contacts::create_contact)
                .patch(routes::contacts::update_contact_status),
        )
        .route(
            "/api/popup",
            get(routes::popup::list_popups).post(routes::popup::create_popup),
        )
        .route(
            "/api/newsletter/subscribers",
            get(routes::newsletter::list_subscribers)
                .post(routes::newsletter::subscribe)
                .patch(routes::newsletter::update_subscriber),
        )
        .route(
            "/api/newsletter/campaigns",
            get(routes::newsletter::list_campaigns)
                .post(routes::newsletter::create_campaign)
                .patch(routes::newsletter::send_campaign),
        )
        .route("/api/dashboard", get(routes::dashboard::get_dashboard_stats))
        .route("/api/logs", post(routes::logs::receive_client_logs))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

fn bind_address() -> Result<SocketAddr, StartupError> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);

    let addr = format!("{}:{}", host, port);
    addr.parse().map_err(|_| StartupError::Address(addr))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&LogConfig::from_env());
    routes::health::init_start_time();

    let result = serve().await;
    if let Err(e) = &result {
        tracing::error!("server stopped: {}", e);
    }
    result
}

async fn serve() -> Result<(), StartupError> {
    // No fallback store: a missing MONGODB_URI aborts startup.
    let db_config = DbConfig::from_env()?;
    let client = db::client(&db_config).await?;
    let store = MongoStore::new(client, &db_config.database);

    if let Err(e) = store.init().await {
        tracing::warn!("could not ensure subscriber email index: {}", e);
    }

    let app = create_app(AppState::new(Arc::new(store)));

    let addr = bind_address()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
