use serde::Serialize;

/// Typed events handed to the notification sink. Grouped variants
/// (`AttestationsMissed`, `WithdrawalsBatched`) carry one batch's worth of
/// outcomes per label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MonitorEvent {
    BlockProposed {
        label: String,
        validator_index: u64,
        slot: u64,
        exec_block_number: Option<u64>,
    },
    BlockMissed {
        label: String,
        validator_index: u64,
        slot: u64,
    },
    AttestationsMissed {
        label: String,
        validators: Vec<u64>,
        slots: Vec<u64>,
    },
    WithdrawalsBatched {
        label: String,
        entries: Vec<WithdrawalEntry>,
        total_gwei: u64,
    },
    NodeStale {
        slots_behind: u64,
    },
    InternalError {
        message: String,
        batch_range: Option<(u64, u64)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalEntry {
    pub validator_index: u64,
    pub amount_gwei: u64,
    pub slot: u64,
}

/// Event categories under a process-wide notification rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitCategory {
    NodeStale,
    InternalError,
}

impl MonitorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::BlockProposed { .. } => "block_proposed",
            MonitorEvent::BlockMissed { .. } => "block_missed",
            MonitorEvent::AttestationsMissed { .. } => "attestations_missed",
            MonitorEvent::WithdrawalsBatched { .. } => "withdrawals_batched",
            MonitorEvent::NodeStale { .. } => "node_stale",
            MonitorEvent::InternalError { .. } => "internal_error",
        }
    }

    pub fn rate_limit_category(&self) -> Option<RateLimitCategory> {
        match self {
            MonitorEvent::NodeStale { .. } => Some(RateLimitCategory::NodeStale),
            MonitorEvent::InternalError { .. } => Some(RateLimitCategory::InternalError),
            _ => None,
        }
    }
}
