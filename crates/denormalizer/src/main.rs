//! Denormalizer entry point.

use std::sync::Arc;

use change_stream::PostgresChangeStream;
use denormalizer::{BatchDispatcher, ConsumerConfig, HandlerRegistry};
use document_store::PostgresDocumentStore;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, stopping consumer");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, stopping consumer");
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = ConsumerConfig::from_env();
    init_tracing(&config.log_level);

    // 2. Prometheus exporter
    let metrics_addr: std::net::SocketAddr = config
        .metrics_addr
        .parse()
        .expect("METRICS_ADDR must be a socket address");
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("failed to install Prometheus exporter");

    // 3. Database pool and migrations
    let database_url = config
        .database_url
        .clone()
        .expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&database_url)
        .await
        .expect("failed to connect to PostgreSQL");

    let store = PostgresDocumentStore::new(pool.clone());
    store.run_migrations().await.expect("migrations failed");
    let stream = PostgresChangeStream::new(pool, config.consumer_group.clone());

    // 4. Handler registry, built once
    let registry = Arc::new(HandlerRegistry::for_users(store));
    tracing::info!(
        tables = ?registry.tables(),
        consumer_group = %config.consumer_group,
        %metrics_addr,
        "starting denormalizer"
    );

    // 5. Consume until shutdown
    let dispatcher = BatchDispatcher::new(stream, registry, config.dispatch_options());
    dispatcher
        .run(shutdown_signal())
        .await
        .expect("consumer loop failed");

    tracing::info!("denormalizer shut down gracefully");
}
