use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};
use vigil_api_types::{
    attestation::AttestationView, block::BlockSummary, committee::CommitteeData,
    duty::ProposerDutyData,
};
use vigil_participation::{ParticipationError, attesting_indices, decode_electra_aggregate};

use crate::{
    events::{MonitorEvent, WithdrawalEntry},
    registry::ValidatorRegistry,
};

/// An attestation for slot `s` may legally be included in blocks
/// `[s + 1, s + INCLUSION_WINDOW]`.
pub const INCLUSION_WINDOW: u64 = 32;

/// Everything the reconciler needs for one batch `(start_slot, end_slot]`.
///
/// `committees` holds the slots whose committee list could be fetched;
/// missing slots are skipped. `blocks` must cover
/// `(start_slot, end_slot + INCLUSION_WINDOW]`, with `None` marking a missed
/// slot.
#[derive(Debug, Clone)]
pub struct BatchData {
    pub start_slot: u64,
    pub end_slot: u64,
    pub proposer_duties: Vec<ProposerDutyData>,
    pub committees: HashMap<u64, Vec<CommitteeData>>,
    pub blocks: HashMap<u64, Option<BlockSummary>>,
}

/// Per-validator attestation outcome, ordered by `(slot, validator_index)`.
/// Inclusions stay internal; only the missed set surfaces as events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationOutcome {
    pub validator_index: u64,
    pub slot: u64,
    pub included: bool,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub events: Vec<MonitorEvent>,
    pub attestation_outcomes: Vec<AttestationOutcome>,
    pub decode_errors: u64,
    pub skipped_slots: Vec<u64>,
}

/// Join proposer duties, committee assignments, attestation inclusions, and
/// withdrawals for one batch into ordered events.
///
/// Pure with respect to its inputs: fetch failures are resolved by the
/// scheduler before this runs, and malformed attestations are counted and
/// dropped rather than failing the batch.
pub fn reconcile(registry: &ValidatorRegistry, batch: &BatchData) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    reconcile_proposals(registry, batch, &mut outcome);
    reconcile_attestations(registry, batch, &mut outcome);
    reconcile_withdrawals(registry, batch, &mut outcome);

    outcome
}

fn in_batch(batch: &BatchData, slot: u64) -> bool {
    slot > batch.start_slot && slot <= batch.end_slot
}

fn reconcile_proposals(
    registry: &ValidatorRegistry,
    batch: &BatchData,
    outcome: &mut BatchOutcome,
) {
    // One duty per slot; BTreeMap both deduplicates and orders them.
    let duties: BTreeMap<u64, &ProposerDutyData> = batch
        .proposer_duties
        .iter()
        .filter(|duty| in_batch(batch, duty.slot) && registry.is_monitored(duty.validator_index))
        .map(|duty| (duty.slot, duty))
        .collect();

    for (slot, duty) in duties {
        let label = registry
            .label_of(duty.validator_index)
            .unwrap_or_default()
            .to_string();
        let proposed = batch
            .blocks
            .get(&slot)
            .and_then(|block| block.as_ref())
            .filter(|block| block.proposer_index == duty.validator_index);

        match proposed {
            Some(block) => outcome.events.push(MonitorEvent::BlockProposed {
                label,
                validator_index: duty.validator_index,
                slot,
                exec_block_number: block.exec_block_number,
            }),
            None => outcome.events.push(MonitorEvent::BlockMissed {
                label,
                validator_index: duty.validator_index,
                slot,
            }),
        }
    }
}

fn reconcile_attestations(
    registry: &ValidatorRegistry,
    batch: &BatchData,
    outcome: &mut BatchOutcome,
) {
    // label -> (validators, slots) with missed attestations, for grouping.
    let mut missed: BTreeMap<String, (BTreeSet<u64>, BTreeSet<u64>)> = BTreeMap::new();

    for slot in batch.start_slot + 1..=batch.end_slot {
        let Some(committees) = batch.committees.get(&slot) else {
            outcome.skipped_slots.push(slot);
            continue;
        };

        let monitored_in_slot: BTreeSet<u64> = committees
            .iter()
            .flat_map(|committee| committee.validators.iter().copied())
            .filter(|validator_index| registry.is_monitored(*validator_index))
            .collect();
        if monitored_in_slot.is_empty() {
            continue;
        }

        let attested = scan_inclusion_window(batch, slot, committees, outcome);

        for validator_index in monitored_in_slot {
            let included = attested.contains(&validator_index);
            outcome.attestation_outcomes.push(AttestationOutcome {
                validator_index,
                slot,
                included,
            });
            if !included {
                let label = registry
                    .label_of(validator_index)
                    .unwrap_or_default()
                    .to_string();
                let entry = missed.entry(label).or_default();
                entry.0.insert(validator_index);
                entry.1.insert(slot);
            }
        }
    }

    for (label, (validators, slots)) in missed {
        outcome.events.push(MonitorEvent::AttestationsMissed {
            label,
            validators: validators.into_iter().collect(),
            slots: slots.into_iter().collect(),
        });
    }
}

/// Union of all validator indices attested for `slot` across its inclusion
/// window. Re-aggregated duplicates of the same `(slot, committee)` merge
/// here by construction.
fn scan_inclusion_window(
    batch: &BatchData,
    slot: u64,
    committees: &[CommitteeData],
    outcome: &mut BatchOutcome,
) -> HashSet<u64> {
    let mut attested = HashSet::new();

    for inclusion_slot in slot + 1..=slot + INCLUSION_WINDOW {
        let Some(Some(block)) = batch.blocks.get(&inclusion_slot) else {
            continue;
        };
        for attestation in &block.attestations {
            if attestation.data.slot != slot {
                continue;
            }
            match decode_attestation(attestation, committees, inclusion_slot) {
                Ok(indices) => attested.extend(indices),
                Err(err) => {
                    warn!(
                        slot,
                        inclusion_slot,
                        committee_index = attestation.data.index,
                        "Discarding malformed attestation: {err}"
                    );
                    outcome.decode_errors += 1;
                }
            }
        }
    }

    attested
}

fn decode_attestation(
    attestation: &AttestationView,
    committees: &[CommitteeData],
    inclusion_slot: u64,
) -> Result<Vec<u64>, ParticipationError> {
    match &attestation.committee_bits {
        Some(committee_bits) => {
            let records = decode_electra_aggregate(
                &attestation.aggregation_bits,
                committee_bits,
                committees,
                inclusion_slot,
            )?;
            Ok(records
                .into_iter()
                .flat_map(|record| record.attesting_indices)
                .collect())
        }
        None => {
            let committee = committees
                .iter()
                .find(|committee| committee.index == attestation.data.index)
                .ok_or(ParticipationError::UnknownCommittee(attestation.data.index))?;
            attesting_indices(&attestation.aggregation_bits, &committee.validators)
        }
    }
}

fn reconcile_withdrawals(
    registry: &ValidatorRegistry,
    batch: &BatchData,
    outcome: &mut BatchOutcome,
) {
    let mut by_label: BTreeMap<String, (Vec<WithdrawalEntry>, u64)> = BTreeMap::new();

    for slot in batch.start_slot + 1..=batch.end_slot {
        let Some(Some(block)) = batch.blocks.get(&slot) else {
            continue;
        };
        for withdrawal in &block.withdrawals {
            if !registry.is_monitored(withdrawal.validator_index) {
                continue;
            }
            let label = registry
                .label_of(withdrawal.validator_index)
                .unwrap_or_default()
                .to_string();
            let entry = by_label.entry(label).or_default();
            entry.0.push(WithdrawalEntry {
                validator_index: withdrawal.validator_index,
                amount_gwei: withdrawal.amount,
                slot,
            });
            entry.1 += withdrawal.amount;
        }
    }

    for (label, (entries, total_gwei)) in by_label {
        debug!(
            label = %label,
            withdrawals = entries.len(),
            total_gwei,
            "Aggregated withdrawals for batch"
        );
        outcome.events.push(MonitorEvent::WithdrawalsBatched {
            label,
            entries,
            total_gwei,
        });
    }
}
