mod config;

use common::clickhouse::{ClickHouseClient, ClickHouseTelemetryRepository};
use common::nats::NatsClient;
use common::postgres::{ensure_snapshot_schema, PostgresClient, PostgresSnapshotRepository};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryProviders};
use crate::config::ServiceConfig;
use status_ingester::{StatusIngester, StatusIngesterConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

struct Dependencies {
    snapshot_repository: Arc<PostgresSnapshotRepository>,
    analytics_repository: Arc<ClickHouseTelemetryRepository>,
    nats_client: NatsClient,
}

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> =
        match init_telemetry(&config.telemetry_config()) {
            Ok(providers) => providers,
            Err(e) => {
                eprintln!("Failed to initialize telemetry: {}", e);
                std::process::exit(1);
            }
        };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting hydroponics-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let deps = match tokio::time::timeout(startup_timeout, initialize_dependencies(&config)).await
    {
        Ok(Ok(deps)) => deps,
        Ok(Err(e)) => {
            error!("Failed to initialize dependencies: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
        Err(_) => {
            error!(timeout_secs = config.startup_timeout_secs, "Startup timed out");
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let ingester = match StatusIngester::new(
        deps.snapshot_repository,
        deps.analytics_repository,
        deps.nats_client.jetstream(),
        StatusIngesterConfig {
            ingest: config.ingest_config(),
            consumer: config.consumer_settings(),
        },
    )
    .await
    {
        Ok(ingester) => ingester,
        Err(e) => {
            error!("Failed to initialize status ingester: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let token = CancellationToken::new();
    spawn_signal_handlers(token.clone());

    let run_result = ingester.run(token.clone()).await;
    if let Err(e) = &run_result {
        error!("Status ingester failed: {:#}", e);
    }

    info!("Running cleanup tasks...");
    let cleanup = async {
        if let Err(e) = deps.nats_client.close().await {
            error!("Failed to close NATS connection: {:#}", e);
        }
    };
    if tokio::time::timeout(CLEANUP_TIMEOUT, cleanup).await.is_err() {
        error!("Cleanup timed out after {:?}", CLEANUP_TIMEOUT);
    }
    info!("Cleanup complete");

    shutdown_telemetry(telemetry_providers);

    if run_result.is_err() {
        std::process::exit(1);
    }
}

async fn initialize_dependencies(config: &ServiceConfig) -> anyhow::Result<Dependencies> {
    info!("Initializing PostgreSQL...");
    let postgres_client = PostgresClient::new(&config.postgres_config())?;
    postgres_client.ping().await?;
    ensure_snapshot_schema(&postgres_client).await?;

    info!("Initializing ClickHouse...");
    let clickhouse_client = ClickHouseClient::new(&config.clickhouse_config());
    clickhouse_client.ping().await?;
    clickhouse_client
        .ensure_telemetry_table(&config.ingest_config().analytics)
        .await?;

    info!("Initializing NATS...");
    let nats_client = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.startup_timeout_secs),
    )
    .await?;
    nats_client
        .ensure_stream(&config.nats_stream, &[config.nats_subject.clone()])
        .await?;

    Ok(Dependencies {
        snapshot_repository: Arc::new(PostgresSnapshotRepository::new(postgres_client)),
        analytics_repository: Arc::new(ClickHouseTelemetryRepository::new(clickhouse_client)),
        nats_client,
    })
}

/// Cancel the token on SIGINT, and on SIGTERM where available
fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => {
                error!("Error setting up SIGTERM handler: {}", err);
            }
        }
    });
}
