use std::time::Duration;

use url::Url;

/// Static configuration snapshot for the slot monitor. Assembled once at
/// startup from the CLI; the core never re-reads configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Slots per reconciliation batch.
    pub batch_size: u64,
    /// Idle time between catch-up cycles.
    pub polling_interval: Duration,
    /// Distance of the safe-slot frontier behind the head, in epochs.
    pub epochs_before_final: u64,
    /// Hard ceiling on concurrent outbound beacon requests.
    pub max_concurrent_requests: usize,
    /// Head lag (in slots) beyond which the node is reported stale.
    pub stale_threshold_slots: u64,
    /// Minimum interval between warning-class notifications per category.
    pub notification_rate_limit: Duration,
    /// Cursor seed used when the store holds no persisted cursor yet.
    pub initial_slot: u64,
    /// Replace the notifier with a no-op stub; core behavior is unchanged.
    pub test_mode: bool,
    /// Relay-style endpoint for the fire-and-forget MEV reward lookup.
    pub mev_reward_endpoint: Option<Url>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            polling_interval: Duration::from_secs(60),
            epochs_before_final: 1,
            max_concurrent_requests: 30,
            stale_threshold_slots: 10,
            notification_rate_limit: Duration::from_secs(1800),
            initial_slot: 0,
            test_mode: false,
            mev_reward_endpoint: None,
        }
    }
}
