use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use url::Url;
use vigil_monitor::config::MonitorConfig;
use vigil_network_spec::{cli::network_parser, networks::NetworkSpec};

use crate::cli::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BEACON_API_ENDPOINT, DEFAULT_EPOCHS_BEFORE_FINAL,
    DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_NETWORK, DEFAULT_NOTIFICATION_RATE_LIMIT_SECS,
    DEFAULT_POLLING_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STALE_THRESHOLD_SLOTS,
};

#[derive(Debug, Parser)]
pub struct MonitorNodeConfig {
    #[arg(
        long,
        help = "Choose mainnet, holesky, sepolia, hoodi, or dev",
        default_value = DEFAULT_NETWORK,
        value_parser = network_parser
    )]
    pub network: Arc<NetworkSpec>,

    #[arg(long, help = "Set HTTP url of the beacon api endpoint", default_value = DEFAULT_BEACON_API_ENDPOINT)]
    pub beacon_api_endpoint: Url,

    #[arg(long, help = "Set HTTP request timeout for beacon api calls", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = duration_parser)]
    pub request_timeout: Duration,

    #[arg(
        long,
        help = "YAML file mapping labels to monitored validator indices"
    )]
    pub validators_file: PathBuf,

    #[arg(
        long,
        help = "The directory for storing application data. If used together with --ephemeral, new child directory will be created."
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        short,
        help = "Use new data directory, located in OS temporary directory. If used together with --data-dir, new directory will be created there instead."
    )]
    pub ephemeral: bool,

    #[arg(
        long,
        help = "Slot to start monitoring from when no cursor is persisted yet",
        default_value_t = 0
    )]
    pub initial_slot: u64,

    #[arg(long, help = "Slots per reconciliation batch", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u64,

    #[arg(long, help = "Seconds between catch-up cycles", default_value_t = DEFAULT_POLLING_INTERVAL_SECS)]
    pub polling_interval: u64,

    #[arg(
        long,
        help = "Epochs to stay behind the head when computing the safe slot",
        default_value_t = DEFAULT_EPOCHS_BEFORE_FINAL
    )]
    pub epochs_before_final: u64,

    #[arg(long, help = "Maximum concurrent beacon api requests", default_value_t = DEFAULT_MAX_CONCURRENT_REQUESTS)]
    pub max_concurrent_requests: usize,

    #[arg(
        long,
        help = "Head lag in slots before the node is reported stale",
        default_value_t = DEFAULT_STALE_THRESHOLD_SLOTS
    )]
    pub stale_threshold_slots: u64,

    #[arg(
        long,
        help = "Minimum seconds between warning notifications per category",
        default_value_t = DEFAULT_NOTIFICATION_RATE_LIMIT_SECS
    )]
    pub notification_rate_limit_secs: u64,

    #[arg(long, help = "Relay-style endpoint for MEV reward lookups")]
    pub mev_reward_endpoint: Option<Url>,

    #[arg(long, help = "Port to serve prometheus metrics on")]
    pub metrics_port: Option<u16>,

    #[arg(long, help = "Replace the notifier with a no-op stub")]
    pub test_mode: bool,
}

impl MonitorNodeConfig {
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            batch_size: self.batch_size,
            polling_interval: Duration::from_secs(self.polling_interval),
            epochs_before_final: self.epochs_before_final,
            max_concurrent_requests: self.max_concurrent_requests,
            stale_threshold_slots: self.stale_threshold_slots,
            notification_rate_limit: Duration::from_secs(self.notification_rate_limit_secs),
            initial_slot: self.initial_slot,
            test_mode: self.test_mode,
            mev_reward_endpoint: self.mev_reward_endpoint.clone(),
        }
    }
}

pub fn duration_parser(duration_string: &str) -> Result<Duration, String> {
    Ok(Duration::from_secs(duration_string.parse().map_err(
        |err| format!("Could not parse the request timeout: {err:?}"),
    )?))
}
