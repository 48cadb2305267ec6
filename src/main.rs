//! Inventra Server - Institutional Inventory & Lending Management
//!
//! REST API server for lending transactions, overdue tracking, and
//! SLA-driven maintenance workflows.

use axum::{
    routing::{get, post},
    Router,
};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventra_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{notifications::EmailNotifier, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("inventra_server={},tower_http=debug", config.logging.level).into()
    });

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Inventra Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let overdue_interval = Duration::from_secs(config.lending.overdue_sweep_interval_secs);
    let sla_interval = Duration::from_secs(config.lending.sla_sweep_interval_secs);

    // Create repository and services
    let time = Arc::new(SafeTimeProvider::new(TimeSource::System));
    let notifier = Arc::new(EmailNotifier::new(config.email.clone()));
    let repository = Repository::new(pool);
    let services = Arc::new(
        Services::new(repository, &config.lending, notifier, time)
            .expect("Failed to create services"),
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: services.clone(),
    };

    // Spawn the periodic sweep jobs
    spawn_overdue_sweep(services.clone(), overdue_interval);
    spawn_sla_sweep(services, sla_interval);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically flag overdue transactions and send overdue notices
fn spawn_overdue_sweep(services: Arc<Services>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match services.transactions.update_overdue_status().await {
                Ok(outcome) => {
                    if outcome.transactions_updated > 0 || outcome.notifications_failed > 0 {
                        tracing::info!(
                            updated = outcome.transactions_updated,
                            notified = outcome.notifications_sent,
                            failed = outcome.notifications_failed,
                            "Overdue sweep completed"
                        );
                    }
                }
                Err(e) => tracing::error!("Overdue sweep failed: {}", e),
            }
        }
    });
}

/// Periodically flag maintenance requests that have blown their SLA deadline
fn spawn_sla_sweep(services: Arc<Services>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match services.sla.check_sla_breaches().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(newly_breached = n, "SLA sweep completed"),
                Err(e) => tracing::error!("SLA sweep failed: {}", e),
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Items
        .route("/items", get(api::items::list_items))
        .route("/items/:id", get(api::items::get_item))
        // Transactions (loans)
        .route("/transactions", post(api::transactions::checkout))
        .route("/transactions", get(api::transactions::list_transactions))
        .route(
            "/transactions/overdue",
            get(api::transactions::overdue_transactions),
        )
        .route("/transactions/:id", get(api::transactions::get_transaction))
        .route(
            "/transactions/:id/late-fee",
            get(api::transactions::late_fee_preview),
        )
        .route(
            "/transactions/:id/return",
            post(api::transactions::return_item),
        )
        .route(
            "/transactions/:id/cancel",
            post(api::transactions::cancel_transaction),
        )
        .route(
            "/transactions/:id/extend",
            post(api::transactions::extend_due_date),
        )
        .route(
            "/transactions/:id/pay-late-fee",
            post(api::transactions::pay_late_fee),
        )
        .route(
            "/users/:id/transactions",
            get(api::transactions::user_transactions),
        )
        // Maintenance requests / SLA
        .route("/maintenance", post(api::maintenance::create_request))
        .route("/maintenance", get(api::maintenance::list_requests))
        .route(
            "/maintenance/statistics",
            get(api::maintenance::maintenance_statistics),
        )
        .route(
            "/maintenance/sla/statistics",
            get(api::maintenance::sla_statistics),
        )
        .route("/maintenance/:id", get(api::maintenance::get_request))
        .route(
            "/maintenance/:id/assign",
            post(api::maintenance::assign_request),
        )
        .route(
            "/maintenance/:id/complete",
            post(api::maintenance::complete_request),
        )
        .route(
            "/maintenance/:id/cancel",
            post(api::maintenance::cancel_request),
        )
        .route(
            "/maintenance/:id/sla",
            get(api::maintenance::time_remaining),
        )
        // Manual sweep triggers
        .route("/jobs/overdue-sweep", post(api::jobs::overdue_sweep))
        .route("/jobs/sla-sweep", post(api::jobs::sla_sweep))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
