//! # Brokerwatch Web Server
//!
//! The REST surface over the database and the performance engine. Every route
//! except the health checks runs on behalf of the user named in the identity
//! header, which the fronting gateway sets after authenticating the caller.

use analytics::PerformanceEngine;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    routing::{get, put},
    Router,
};
use configuration::{error::ConfigError, ServerSettings, Settings};
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod identity;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub db_repo: DbRepository,
    pub engine: PerformanceEngine,
    pub identity_header: HeaderName,
}

impl AppState {
    pub fn new(db_repo: DbRepository, settings: &Settings) -> Result<Self, ConfigError> {
        let identity_header = HeaderName::from_bytes(settings.auth.identity_header.trim().as_bytes())
            .map_err(|e| {
                ConfigError::ValidationError(format!("auth.identity_header is not a valid header name: {e}"))
            })?;
        Ok(Self {
            db_repo,
            engine: PerformanceEngine::new(),
            identity_header,
        })
    }
}

/// Wires every route and the middleware stack onto the given state.
pub fn build_router(state: Arc<AppState>, settings: &ServerSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/ready", get(handlers::readiness))
        .route(
            "/api/accounts",
            get(handlers::accounts::list_accounts).post(handlers::accounts::create_account),
        )
        .route("/api/accounts/:account_id", put(handlers::accounts::update_account))
        .route(
            "/api/accounts/:account_id/values",
            get(handlers::values::get_account_values).post(handlers::values::post_account_value),
        )
        .route(
            "/api/accounts/:account_id/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::post_transaction),
        )
        .route(
            "/api/accounts/:account_id/positions",
            get(handlers::positions::list_positions).post(handlers::positions::post_position),
        )
        .route(
            "/api/strategies",
            get(handlers::strategies::list_strategies).post(handlers::strategies::create_strategy),
        )
        .route(
            "/api/strategies/:strategy_id",
            put(handlers::strategies::update_strategy),
        )
        .route(
            "/api/strategies/:strategy_id/performance",
            get(handlers::strategies::strategy_performance),
        )
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes))
}

/// Connects to the database, applies migrations and serves until Ctrl-C.
///
/// Tracing is initialized by the caller.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let db_pool = database::connect(&settings.database).await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let app_state = Arc::new(AppState::new(db_repo, &settings)?);
    let app = build_router(app_state, &settings.server);

    let addr = settings.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Web server started and listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
