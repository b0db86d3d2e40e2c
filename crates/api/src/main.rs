//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::config::{Config, LogFormat};
use audit_log::{AuditLogStore, InMemoryAuditLogStore, PostgresAuditLogStore};
use common::{Clock, SystemClock};
use tokio::signal;
use tokio::task::JoinHandle;
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
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn connect_audit_log(config: &Config) -> Arc<dyn AuditLogStore> {
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("failed to connect to the audit log database");
            let store = PostgresAuditLogStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run audit log migrations");
            tracing::info!("using PostgreSQL audit log");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory audit log");
            Arc::new(InMemoryAuditLogStore::new())
        }
    }
}

/// Periodically removes audit records past their expiry.
fn spawn_ttl_sweeper(store: Arc<dyn AuditLogStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired(SystemClock.now()).await {
                Ok(0) => {}
                Ok(purged) => {
                    metrics::counter!("audit_records_purged_total").increment(purged);
                    tracing::debug!(purged, "expired audit records removed");
                }
                Err(e) => tracing::warn!(error = %e, "audit log sweep failed"),
            }
        }
    })
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Audit log, event pipeline and application state
    let audit_store = connect_audit_log(&config).await;
    let sweeper = spawn_ttl_sweeper(audit_store.clone(), config.ttl_sweep_interval);
    let (state, channel) = api::create_default_state(&config, audit_store)
        .await
        .expect("failed to wire the event pipeline");

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Let published order events finish recording
    channel.wait_idle().await;
    sweeper.abort();

    tracing::info!("server shut down gracefully");
}
