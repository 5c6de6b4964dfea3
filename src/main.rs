//! Club Ledger server
//!
//! Loads configuration from the environment, selects the PostgreSQL or
//! in-memory store and serves the ledger REST API under `/api`.

use std::sync::Arc;

use axum::Router;
use http::{HeaderName, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_ledger::adapters::http::{ledger_router, LedgerAppState};
use club_ledger::adapters::postgres::{
    run_migrations, PostgresLedgerReader, PostgresLedgerRepository,
};
use club_ledger::application::LedgerFacade;
use club_ledger::config::{AppConfig, ConfigError, DatabaseConfig, ServerConfig, ValidationError};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let facade = build_facade(&config).await?;
    let app = build_router(&config.server, LedgerAppState::new(facade));

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "club ledger listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("club ledger shut down");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| server.log_level.clone().into());

    if server.is_production() {
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
}

async fn build_facade(config: &AppConfig) -> Result<LedgerFacade, StartupError> {
    if !config.database.uses_postgres() {
        warn!("no database URL configured, using the in-memory ledger store");
        return Ok(LedgerFacade::in_memory(&config.ledger));
    }

    let pool = connect(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        info!("database migrations applied");
    }

    Ok(LedgerFacade::new(
        Arc::new(PostgresLedgerRepository::new(pool.clone())),
        Arc::new(PostgresLedgerReader::new(pool)),
        &config.ledger,
    ))
}

async fn connect(database: &DatabaseConfig) -> Result<sqlx::PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .idle_timeout(database.idle_timeout())
        .max_lifetime(database.max_lifetime())
        .connect(&database.url)
        .await
}

fn build_router(server: &ServerConfig, state: LedgerAppState) -> Router {
    Router::new()
        .nest("/api", ledger_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-role"),
            HeaderName::from_static("x-correlation-id"),
            HeaderName::from_static("x-deadline-ms"),
        ]);

    if origins.is_empty() && !server.is_production() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
