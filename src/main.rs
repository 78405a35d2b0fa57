//! Storefront billing service entry point.
//!
//! Loads configuration, wires repositories and payment gateways, and serves
//! the billing API under `/api`.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use storefront_billing::adapters::gateways::GatewayRegistry;
use storefront_billing::adapters::http::{billing_router, BillingAppState};
use storefront_billing::adapters::memory::{
    InMemoryDiscountRepository, InMemoryOrderRepository, InMemorySubscriptionRepository,
};
use storefront_billing::adapters::postgres::{
    PostgresDiscountRepository, PostgresOrderRepository, PostgresSubscriptionRepository,
};
use storefront_billing::adapters::TracingEventPublisher;
use storefront_billing::config::{
    AppConfig, ConfigError, DatabaseConfig, ServerConfig, ValidationError,
};
use storefront_billing::ports::{
    DiscountRepository, GatewayError, OrderRepository, SubscriptionRepository,
};

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("log filter error: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("payment gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

struct Repositories {
    orders: Arc<dyn OrderRepository>,
    discounts: Arc<dyn DiscountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config)?;

    let gateways = GatewayRegistry::from_config(&config.payment)?;
    tracing::info!(
        providers = ?config.payment.enabled_providers(),
        environment = ?config.server.environment,
        "Payment gateways configured"
    );

    let repositories = match &config.database {
        Some(database) => connect_postgres(database).await?,
        None => {
            tracing::warn!("No database configured; using in-memory stores");
            Repositories {
                orders: Arc::new(InMemoryOrderRepository::new()),
                discounts: Arc::new(InMemoryDiscountRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            }
        }
    };

    let state = BillingAppState {
        orders: repositories.orders,
        discounts: repositories.discounts,
        subscriptions: repositories.subscriptions,
        gateways: Arc::new(gateways),
        event_publisher: Arc::new(TracingEventPublisher::new()),
        status_check_timeout: config.payment.status_check_timeout(),
    };

    let mut app = Router::new()
        .nest("/api", billing_router())
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
    if let Some(cors) = cors_layer(&config.server)? {
        app = app.layer(cors);
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Billing service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Billing service stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))?;

    if config.server.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// CORS for browser storefronts. Provider callbacks are server-to-server
/// and unaffected.
fn cors_layer(server: &ServerConfig) -> Result<Option<CorsLayer>, StartupError> {
    let origins = server
        .cors_origins()
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ValidationError::InvalidCorsOrigin(origin.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if origins.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::HeaderName::from_static("x-user-id"),
                axum::http::HeaderName::from_static("x-user-role"),
            ]),
    ))
}

async fn connect_postgres(database: &DatabaseConfig) -> Result<Repositories, StartupError> {
    let pool = database.pool_options().connect(&database.url).await?;

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Repositories {
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        discounts: Arc::new(PostgresDiscountRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool)),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
