pub mod helpers;

use std::{net::SocketAddr, sync::LazyLock};

use anyhow::anyhow;
use prometheus_exporter::{
    Exporter,
    prometheus::{IntCounter, IntCounterVec, IntGauge},
};

pub use crate::helpers::{
    create_int_counter, create_int_counter_vec, create_int_gauge, inc_int_counter_vec,
    set_int_gauge,
};

pub static HEAD_SLOT: LazyLock<IntGauge> = LazyLock::new(|| {
    create_int_gauge(
        "vigil_head_slot",
        "Latest head slot reported by the beacon node",
    )
});

pub static CURSOR_SLOT: LazyLock<IntGauge> = LazyLock::new(|| {
    create_int_gauge("vigil_cursor_slot", "Last fully processed slot")
});

pub static BATCHES_PROCESSED: LazyLock<IntCounter> = LazyLock::new(|| {
    create_int_counter("vigil_batches_processed", "Completed reconciliation batches")
});

pub static CACHE_HITS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    create_int_counter_vec("vigil_cache_hits", "Cache hits per store", &["store"])
});

pub static CACHE_MISSES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    create_int_counter_vec("vigil_cache_misses", "Cache misses per store", &["store"])
});

pub static EVENTS_EMITTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    create_int_counter_vec("vigil_events_emitted", "Emitted events per kind", &["kind"])
});

pub static DECODE_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    create_int_counter(
        "vigil_decode_errors",
        "Attestations discarded due to malformed participation bitfields",
    )
});

/// Serve the default registry over HTTP. The returned exporter must be kept
/// alive for the lifetime of the process.
pub fn start_exporter(address: SocketAddr) -> anyhow::Result<Exporter> {
    prometheus_exporter::start(address)
        .map_err(|err| anyhow!("Failed to start metrics exporter: {err:?}"))
}
