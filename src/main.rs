//! Fairway service entry point.
//!
//! Wires the durable PostgreSQL repositories, the in-process usage
//! meter, and the HTTP surfaces, then serves the admin and metering
//! APIs. A background task periodically compacts raw usage samples and
//! flushes the resulting rollup buckets to durable storage.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fairway::adapters::http::{
    admin_router, metering_router, require_platform_admin, AdminAppState, AuthState,
    MeteringAppState,
};
use fairway::adapters::identity::JwtIdentityProvider;
use fairway::adapters::metering::InMemoryUsageMeter;
use fairway::adapters::payment::MockPaymentProcessor;
use fairway::adapters::postgres::{
    PostgresCustomerRepository, PostgresInvoiceRepository, PostgresRevenueLedger,
    PostgresRollupStore, PostgresSubscriptionRepository, PostgresTenantRepository,
};
use fairway::config::AppConfig;
use fairway::domain::foundation::Timestamp;
use fairway::domain::subscription::DEFAULT_CATALOG;
use fairway::ports::RateLimitCeiling;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let usage_meter = Arc::new(
        InMemoryUsageMeter::new().with_default_rate_limit(RateLimitCeiling {
            max_calls: config.metering.rate_limit_max_calls,
            window_secs: config.metering.rate_limit_window_secs,
        }),
    );

    // TODO: swap in the production gateway adapter once the processor
    // integration contract is finalized.
    let payment_processor = Arc::new(MockPaymentProcessor::new());

    let admin_state = AdminAppState {
        tenant_repository: Arc::new(PostgresTenantRepository::new(pool.clone())),
        customer_repository: Arc::new(PostgresCustomerRepository::new(pool.clone())),
        subscription_repository: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        invoice_repository: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
        revenue_ledger: Arc::new(PostgresRevenueLedger::new(pool.clone())),
        usage_meter: usage_meter.clone(),
        payment_processor,
        catalog: Arc::new(DEFAULT_CATALOG.clone()),
        billing_config: config.billing.to_cycle_config(),
    };
    let metering_state = MeteringAppState {
        usage_meter: usage_meter.clone(),
    };
    let auth_state = AuthState {
        identity_provider: Arc::new(JwtIdentityProvider::new(&config.auth.jwt_secret)),
    };

    spawn_rollup_flusher(
        usage_meter,
        PostgresRollupStore::new(pool),
        config.metering.rollup_interval_secs,
    );

    let app = axum::Router::new()
        .nest(
            "/api/admin",
            admin_router()
                .with_state(admin_state)
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    require_platform_admin,
                )),
        )
        .nest("/api/meter", metering_router().with_state(metering_state))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "fairway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically compacts raw samples and flushes rollup deltas.
fn spawn_rollup_flusher(
    meter: Arc<InMemoryUsageMeter>,
    store: PostgresRollupStore,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;

            // Compact everything older than a minute; the trailing edge
            // stays raw so the sliding rate-limit window is unaffected.
            let cutoff =
                Timestamp::from_unix_secs(Timestamp::now().as_unix_secs().saturating_sub(60));

            match fairway::ports::UsageMeter::compact(meter.as_ref(), cutoff).await {
                Ok(0) => {}
                Ok(compacted) => {
                    let buckets = meter.take_pending_flush().await;
                    if let Err(err) = store.upsert(&buckets).await {
                        tracing::warn!(error = %err, "rollup flush failed; will retry");
                    } else {
                        tracing::debug!(compacted, flushed = buckets.len(), "rollups flushed");
                    }
                }
                Err(err) => tracing::warn!(error = %err, "usage compaction failed"),
            }
        }
    });
}
