use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};
use vigil_metrics::{EVENTS_EMITTED, inc_int_counter_vec};

use crate::events::{MonitorEvent, RateLimitCategory};

/// Delivery boundary towards the external notification sink. The monitor
/// only ever hands over typed events; formatting and transport live behind
/// this trait.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &MonitorEvent);
}

/// Default sink: structured log output.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::BlockProposed {
                label,
                validator_index,
                slot,
                exec_block_number,
            } => info!(
                label = %label,
                validator_index,
                slot,
                exec_block_number = ?exec_block_number,
                "Block proposed"
            ),
            MonitorEvent::BlockMissed {
                label,
                validator_index,
                slot,
            } => warn!(label = %label, validator_index, slot, "Block proposal missed"),
            MonitorEvent::AttestationsMissed {
                label,
                validators,
                slots,
            } => warn!(
                label = %label,
                validators = ?validators,
                slots = ?slots,
                "Attestations missed"
            ),
            MonitorEvent::WithdrawalsBatched {
                label,
                entries,
                total_gwei,
            } => info!(
                label = %label,
                withdrawals = entries.len(),
                total_gwei,
                "Withdrawals received"
            ),
            MonitorEvent::NodeStale { slots_behind } => {
                warn!(slots_behind, "Beacon node is lagging wall clock")
            }
            MonitorEvent::InternalError {
                message,
                batch_range,
            } => warn!(message = %message, batch_range = ?batch_range, "Monitor error"),
        }
    }
}

/// Sink used in test mode: swallows everything.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &MonitorEvent) {}
}

/// Per-category minimum interval between notifications. Only warning-class
/// categories are limited; duty outcomes always go through.
pub struct RateLimiter {
    window: Duration,
    last_sent: HashMap<RateLimitCategory, Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: HashMap::new(),
        }
    }

    pub fn allow(&mut self, category: RateLimitCategory) -> bool {
        self.allow_at(category, Instant::now())
    }

    fn allow_at(&mut self, category: RateLimitCategory, now: Instant) -> bool {
        match self.last_sent.get(&category) {
            Some(last) if now.duration_since(*last) < self.window => false,
            _ => {
                self.last_sent.insert(category, now);
                true
            }
        }
    }
}

/// Synchronous, ordered delivery of monitor events to the notifier.
pub struct EventEmitter {
    notifier: Box<dyn Notifier>,
    rate_limiter: RateLimiter,
}

impl EventEmitter {
    pub fn new(notifier: Box<dyn Notifier>, rate_limit_window: Duration) -> Self {
        Self {
            notifier,
            rate_limiter: RateLimiter::new(rate_limit_window),
        }
    }

    /// Deliver one event. Returns whether it was actually sent; rate-limited
    /// categories may be suppressed.
    pub fn emit(&mut self, event: MonitorEvent) -> bool {
        if let Some(category) = event.rate_limit_category()
            && !self.rate_limiter.allow(category)
        {
            debug!(kind = event.kind(), "Notification suppressed by rate limit");
            return false;
        }
        inc_int_counter_vec(&EVENTS_EMITTED, &[event.kind()]);
        self.notifier.notify(&event);
        true
    }
}
