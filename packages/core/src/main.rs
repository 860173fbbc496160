use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;

use hospital_resource_tracker::api::{create_router, AppState};
use hospital_resource_tracker::cli::Cli;
use hospital_resource_tracker::clock::SystemClock;
use hospital_resource_tracker::config::Config;
use hospital_resource_tracker::error::AppError;
use hospital_resource_tracker::logging::init_logging;
use hospital_resource_tracker::metrics::AppMetrics;
use hospital_resource_tracker::monitor::SanitationMonitor;
use hospital_resource_tracker::seed::seed_sample_data;
use hospital_resource_tracker::store::HospitalData;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = Config::from_env()
        .and_then(|config| config.with_cli(&cli))
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    tracing::info!("Service starting with config: {:?}", config);

    if let Err(err) = run(config).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let hospital = Arc::new(HospitalData::new(Arc::new(SystemClock)));
    if config.seed_sample_data {
        seed_sample_data(&hospital);
    }

    let metrics = Arc::new(AppMetrics::new()?);
    metrics.observe(&hospital);

    let monitor = SanitationMonitor::start(
        hospital.clone(),
        metrics.clone(),
        Duration::from_secs(config.sanitation_check_interval_seconds),
    );

    let app = create_router(Arc::new(AppState { hospital, metrics }));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitor.shutdown().await;
    tracing::info!("Shutdown complete");
    served.map_err(AppError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
