use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;
use vigil_beacon_client::{BeaconApiClient, cache::CacheConfig};
use vigil_monitor::{
    emitter::{EventEmitter, LogNotifier, NoopNotifier, Notifier},
    mev::MevRewardClient,
    registry::ValidatorRegistry,
    scheduler::Scheduler,
};
use vigil_storage::{MonitorDB, dir::setup_data_dir};

mod cli;

use crate::cli::{Cli, Commands, constants::BEACON_API_ENDPOINT_ENV, monitor_node::MonitorNodeConfig};

const APP_NAME: &str = "vigil";

#[tokio::main]
async fn main() {
    // Set the default log level to `info` if not set
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor(config) => {
            if let Err(err) = run_monitor(config).await {
                error!("vigil exited with error: {err:?}");
                std::process::exit(1);
            }
        }
    }
}

async fn run_monitor(config: MonitorNodeConfig) -> anyhow::Result<()> {
    info!(network = ?config.network.network, "starting up...");

    let registry = ValidatorRegistry::from_yaml_file(&config.validators_file)?;
    info!(
        "Monitoring {} validator(s) across {} label(s)",
        registry.validator_count(),
        registry.label_count()
    );

    let endpoint = beacon_api_endpoint(&config)?;
    let monitor_config = config.monitor_config();

    let client = Arc::new(BeaconApiClient::new(
        endpoint.clone(),
        config.request_timeout,
        monitor_config.max_concurrent_requests,
        CacheConfig::default(),
    )?);

    // An unreachable beacon node is a configuration error, fatal at startup
    // only; later failures are handled by the scheduler.
    let head_slot = client
        .head_slot()
        .await
        .map_err(|err| anyhow!("Beacon node unreachable at {endpoint}: {err}"))?;
    info!(head_slot, "Connected to beacon node");

    let data_dir = setup_data_dir(APP_NAME, config.data_dir.clone(), config.ephemeral)
        .context("Failed to set up data directory")?;
    let db = MonitorDB::new(&data_dir)?;

    let _metrics_exporter = match config.metrics_port {
        Some(port) => {
            let address: SocketAddr = ([0, 0, 0, 0], port).into();
            info!(%address, "Serving metrics");
            Some(vigil_metrics::start_exporter(address)?)
        }
        None => None,
    };

    let notifier: Box<dyn Notifier> = match monitor_config.test_mode {
        true => Box::new(NoopNotifier),
        false => Box::new(LogNotifier),
    };
    let emitter = EventEmitter::new(notifier, monitor_config.notification_rate_limit);

    let mev = monitor_config
        .mev_reward_endpoint
        .clone()
        .map(|endpoint| MevRewardClient::new(endpoint, config.request_timeout))
        .transpose()?;

    let cache_sweeper = client.spawn_cache_sweeper();

    let scheduler = Scheduler::new(
        client,
        db,
        registry,
        emitter,
        mev,
        config.network.clone(),
        monitor_config,
    )?;

    tokio::select! {
        result = scheduler.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down..."),
    }
    cache_sweeper.abort();

    Ok(())
}

fn beacon_api_endpoint(config: &MonitorNodeConfig) -> anyhow::Result<Url> {
    match env::var(BEACON_API_ENDPOINT_ENV) {
        Ok(raw) if !raw.is_empty() => Url::parse(&raw)
            .map_err(|err| anyhow!("Invalid {BEACON_API_ENDPOINT_ENV} value {raw:?}: {err}")),
        _ => Ok(config.beacon_api_endpoint.clone()),
    }
}
