use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, ensure};
use futures::future::join_all;
use tracing::{debug, info, warn};
use vigil_api_types::{block::BlockSummary, committee::CommitteeData, duty::ProposerDutyData};
use vigil_beacon_client::BeaconApiClient;
use vigil_metrics::{
    BATCHES_PROCESSED, CURSOR_SLOT, DECODE_ERRORS, HEAD_SLOT, set_int_gauge,
};
use vigil_network_spec::{
    networks::NetworkSpec,
    slot::{compute_epoch_at_slot, compute_slot_at_timestamp, compute_start_slot_at_epoch},
};
use vigil_storage::MonitorDB;

use crate::{
    config::MonitorConfig,
    emitter::EventEmitter,
    events::MonitorEvent,
    mev::MevRewardClient,
    reconciler::{BatchData, BatchOutcome, INCLUSION_WINDOW, reconcile},
    registry::ValidatorRegistry,
};

enum CycleOutcome {
    Idle,
    Processed { batches: usize, through_slot: u64 },
}

/// The outer catch-up loop: computes the safe-slot frontier, partitions the
/// backlog into batches, drives fetching and reconciliation, and advances
/// the persisted cursor. Exactly one batch is in flight at a time.
pub struct Scheduler {
    client: Arc<BeaconApiClient>,
    db: MonitorDB,
    registry: ValidatorRegistry,
    emitter: EventEmitter,
    mev: Option<MevRewardClient>,
    spec: Arc<NetworkSpec>,
    config: MonitorConfig,
    cursor: u64,
}

impl Scheduler {
    pub fn new(
        client: Arc<BeaconApiClient>,
        db: MonitorDB,
        registry: ValidatorRegistry,
        emitter: EventEmitter,
        mev: Option<MevRewardClient>,
        spec: Arc<NetworkSpec>,
        config: MonitorConfig,
    ) -> anyhow::Result<Self> {
        ensure!(config.batch_size > 0, "batch size must be at least one slot");
        let cursor = db
            .cursor()
            .get()
            .context("Failed to read persisted cursor")?
            .unwrap_or(config.initial_slot);

        Ok(Self {
            client,
            db,
            registry,
            emitter,
            mev,
            spec,
            config,
            cursor,
        })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            cursor = self.cursor,
            validators = self.registry.validator_count(),
            "Slot monitor started"
        );

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => {
                    debug!(cursor = self.cursor, "Safe slot not yet past cursor")
                }
                Ok(CycleOutcome::Processed {
                    batches,
                    through_slot,
                }) => info!(batches, through_slot, "Catch-up cycle complete"),
                // Head fetch failures are transient; keep polling.
                Err(err) => warn!("Catch-up cycle failed: {err:?}"),
            }
            tokio::time::sleep(self.config.polling_interval).await;
        }
    }

    async fn run_cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        let head_slot = self.client.head_slot().await?;
        set_int_gauge(&HEAD_SLOT, head_slot as i64);
        self.check_node_staleness(head_slot);

        let target = compute_safe_slot(head_slot, self.config.epochs_before_final);
        if target <= self.cursor {
            return Ok(CycleOutcome::Idle);
        }

        let batches = partition_batches(self.cursor, target, self.config.batch_size);
        let batch_count = batches.len();
        for (begin, end) in batches {
            match self.process_batch(begin, end).await {
                Ok(outcome) => self.deliver_batch(outcome),
                Err(err) => {
                    warn!(
                        first_slot = begin + 1,
                        last_slot = end,
                        "Batch failed: {err:?}"
                    );
                    self.emitter.emit(MonitorEvent::InternalError {
                        message: format!("{err:#}"),
                        batch_range: Some((begin + 1, end)),
                    });
                }
            }

            // At-most-once: the cursor advances past failed batches too, so
            // one persistently bad range cannot stall the frontier.
            self.db
                .cursor()
                .set(end)
                .context("Failed to persist cursor")?;
            self.cursor = end;
            set_int_gauge(&CURSOR_SLOT, end as i64);
            BATCHES_PROCESSED.inc();
        }

        let block_stats = self.client.block_cache_stats();
        let committee_stats = self.client.committee_cache_stats();
        debug!(
            block_hit_rate = block_stats.hit_rate(),
            committee_hit_rate = committee_stats.hit_rate(),
            "Cache stats after cycle"
        );

        Ok(CycleOutcome::Processed {
            batches: batch_count,
            through_slot: self.cursor,
        })
    }

    fn check_node_staleness(&mut self, head_slot: u64) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let expected_slot = compute_slot_at_timestamp(self.spec.genesis_time, now);
        let slots_behind = expected_slot.saturating_sub(head_slot);
        if slots_behind > self.config.stale_threshold_slots {
            warn!(head_slot, expected_slot, slots_behind, "Beacon node is stale");
            self.emitter.emit(MonitorEvent::NodeStale { slots_behind });
        }
    }

    /// Fetch one batch's inputs and reconcile them. Committee failures skip
    /// the slot; block and duty failures fail the batch.
    async fn process_batch(&self, begin: u64, end: u64) -> anyhow::Result<BatchOutcome> {
        let scan_slots: Vec<u64> = (begin + 1..=end + INCLUSION_WINDOW).collect();

        // Committee pre-fetch covers the whole scan range: the overlap is
        // served from cache when the next batch asks again.
        let committee_results = join_all(scan_slots.iter().map(|slot| {
            let client = self.client.clone();
            let slot = *slot;
            async move { (slot, client.committees(slot).await) }
        }))
        .await;

        let mut committees: HashMap<u64, Vec<CommitteeData>> = HashMap::new();
        for (slot, result) in committee_results {
            if slot > end {
                continue;
            }
            match result {
                Ok(Some(list)) => {
                    committees.insert(slot, list);
                }
                Ok(None) => warn!(slot, "Committees unavailable; skipping slot"),
                Err(err) => warn!(slot, "Committee fetch failed; skipping slot: {err}"),
            }
        }

        let proposer_duties = self.fetch_proposer_duties(begin + 1, end).await?;

        let block_results = join_all(scan_slots.iter().map(|slot| {
            let client = self.client.clone();
            let slot = *slot;
            async move { (slot, client.block(slot).await) }
        }))
        .await;

        let mut blocks: HashMap<u64, Option<BlockSummary>> = HashMap::new();
        for (slot, result) in block_results {
            let block = result.with_context(|| format!("Failed to fetch block {slot}"))?;
            blocks.insert(slot, block);
        }

        Ok(reconcile(
            &self.registry,
            &BatchData {
                start_slot: begin,
                end_slot: end,
                proposer_duties,
                committees,
                blocks,
            },
        ))
    }

    async fn fetch_proposer_duties(
        &self,
        first_slot: u64,
        last_slot: u64,
    ) -> anyhow::Result<Vec<ProposerDutyData>> {
        let first_epoch = compute_epoch_at_slot(first_slot);
        let last_epoch = compute_epoch_at_slot(last_slot);

        let mut duties = Vec::new();
        for epoch in first_epoch..=last_epoch {
            match self
                .client
                .proposer_duties(epoch)
                .await
                .with_context(|| format!("Failed to fetch proposer duties for epoch {epoch}"))?
            {
                Some(epoch_duties) => duties.extend(epoch_duties),
                None => warn!(epoch, "Proposer duties unavailable; skipping epoch"),
            }
        }
        Ok(duties)
    }

    /// Emit a finished batch's events in order, then kick off MEV lookups.
    fn deliver_batch(&mut self, outcome: BatchOutcome) {
        if outcome.decode_errors > 0 {
            DECODE_ERRORS.inc_by(outcome.decode_errors);
        }
        let included = outcome
            .attestation_outcomes
            .iter()
            .filter(|attestation| attestation.included)
            .count();
        debug!(
            included,
            missed = outcome.attestation_outcomes.len() - included,
            skipped_slots = outcome.skipped_slots.len(),
            "Batch reconciled"
        );

        let mut proposed = Vec::new();
        for event in &outcome.events {
            if let MonitorEvent::BlockProposed {
                validator_index,
                slot,
                exec_block_number: Some(block_number),
                ..
            } = event
            {
                proposed.push((*validator_index, *slot, *block_number));
            }
        }

        for event in outcome.events {
            self.emitter.emit(event);
        }

        if let Some(mev) = &self.mev {
            for (validator_index, slot, block_number) in proposed {
                mev.spawn_lookup(validator_index, slot, block_number);
            }
        }
    }
}

/// Highest slot safe to reconcile: the start of the epoch
/// `epochs_before_final` behind the head's epoch.
pub fn compute_safe_slot(head_slot: u64, epochs_before_final: u64) -> u64 {
    compute_start_slot_at_epoch(compute_epoch_at_slot(head_slot).saturating_sub(epochs_before_final))
}

/// Partition `(cursor, target]` into consecutive `(begin, end]` batches of at
/// most `batch_size` slots.
pub fn partition_batches(cursor: u64, target: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let mut batches = Vec::new();
    let mut begin = cursor;
    while begin < target {
        let end = (begin + batch_size).min(target);
        batches.push((begin, end));
        begin = end;
    }
    batches
}
