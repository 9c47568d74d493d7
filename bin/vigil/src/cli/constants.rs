pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_BEACON_API_ENDPOINT: &str = "http://127.0.0.1:5052";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "5";
pub const DEFAULT_BATCH_SIZE: u64 = 100;
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_EPOCHS_BEFORE_FINAL: u64 = 1;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 30;
pub const DEFAULT_STALE_THRESHOLD_SLOTS: u64 = 10;
pub const DEFAULT_NOTIFICATION_RATE_LIMIT_SECS: u64 = 1800;

/// Environment variable overriding `--beacon-api-endpoint` when set.
pub const BEACON_API_ENDPOINT_ENV: &str = "VIGIL_BEACON_API_ENDPOINT";
