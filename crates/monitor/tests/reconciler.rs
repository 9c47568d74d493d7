//! End-to-end reconciliation scenarios over synthesized beacon responses.

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::Address;
use vigil_api_types::{
    attestation::{AttestationDataView, AttestationView},
    block::BlockSummary,
    committee::CommitteeData,
    duty::ProposerDutyData,
    withdrawal::Withdrawal,
};
use vigil_monitor::{
    events::{MonitorEvent, WithdrawalEntry},
    reconciler::{BatchData, reconcile},
    registry::ValidatorRegistry,
};

fn registry(entries: &[(&str, &[u64])]) -> ValidatorRegistry {
    let labels: BTreeMap<String, Vec<u64>> = entries
        .iter()
        .map(|(label, indices)| (label.to_string(), indices.to_vec()))
        .collect();
    ValidatorRegistry::new(labels).unwrap()
}

fn duty(slot: u64, validator_index: u64) -> ProposerDutyData {
    ProposerDutyData {
        pubkey: format!("0x{validator_index:096x}"),
        validator_index,
        slot,
    }
}

fn committee(slot: u64, index: u64, validators: &[u64]) -> CommitteeData {
    CommitteeData {
        index,
        slot,
        validators: validators.to_vec(),
    }
}

fn block(slot: u64, proposer_index: u64, exec_block_number: Option<u64>) -> BlockSummary {
    BlockSummary {
        slot,
        proposer_index,
        exec_block_number,
        attestations: Vec::new(),
        withdrawals: Vec::new(),
    }
}

fn attestation(slot: u64, index: u64, aggregation_bits: &str) -> AttestationView {
    AttestationView {
        aggregation_bits: aggregation_bits.to_string(),
        data: AttestationDataView { slot, index },
        committee_bits: None,
    }
}

fn electra_attestation(slot: u64, aggregation_bits: &str, committee_bits: &str) -> AttestationView {
    AttestationView {
        aggregation_bits: aggregation_bits.to_string(),
        data: AttestationDataView { slot, index: 0 },
        committee_bits: Some(committee_bits.to_string()),
    }
}

fn withdrawal(index: u64, validator_index: u64, amount: u64) -> Withdrawal {
    Withdrawal {
        index,
        validator_index,
        address: Address::ZERO,
        amount,
    }
}

fn batch(start_slot: u64, end_slot: u64) -> BatchData {
    BatchData {
        start_slot,
        end_slot,
        proposer_duties: Vec::new(),
        committees: HashMap::new(),
        blocks: HashMap::new(),
    }
}

#[test]
fn test_proposal_success() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(199, 200);
    batch.proposer_duties = vec![duty(200, 100)];
    batch.committees.insert(200, Vec::new());
    batch
        .blocks
        .insert(200, Some(block(200, 100, Some(500))));

    let outcome = reconcile(&registry, &batch);

    assert_eq!(
        outcome.events,
        vec![MonitorEvent::BlockProposed {
            label: "alpha".to_string(),
            validator_index: 100,
            slot: 200,
            exec_block_number: Some(500),
        }]
    );
    assert!(outcome.attestation_outcomes.is_empty());
}

#[test]
fn test_proposal_missed_on_tombstone() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(199, 200);
    batch.proposer_duties = vec![duty(200, 100)];
    batch.committees.insert(200, Vec::new());
    batch.blocks.insert(200, None);

    let outcome = reconcile(&registry, &batch);

    assert_eq!(
        outcome.events,
        vec![MonitorEvent::BlockMissed {
            label: "alpha".to_string(),
            validator_index: 100,
            slot: 200,
        }]
    );
}

#[test]
fn test_unmonitored_duties_produce_no_events() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(199, 200);
    batch.proposer_duties = vec![duty(200, 999)];
    batch.committees.insert(200, Vec::new());
    batch.blocks.insert(200, None);

    let outcome = reconcile(&registry, &batch);
    assert!(outcome.events.is_empty());
}

#[test]
fn test_duplicate_duty_emits_once() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(199, 200);
    batch.proposer_duties = vec![duty(200, 100), duty(200, 100)];
    batch.committees.insert(200, Vec::new());
    batch.blocks.insert(200, None);

    let outcome = reconcile(&registry, &batch);
    assert_eq!(outcome.events.len(), 1);
}

#[test]
fn test_legacy_attestation_inclusion() {
    // Committee 2 at slot 300 is [100, 200, 300, 400]; aggregation bits 0x1b
    // carry data bits 1,1,0,1. Monitored: 100, 300, 400.
    let registry = registry(&[("alpha", &[100, 300, 400])]);
    let mut batch = batch(299, 300);
    batch
        .committees
        .insert(300, vec![committee(300, 2, &[100, 200, 300, 400])]);

    let mut inclusion_block = block(305, 7, None);
    inclusion_block.attestations.push(attestation(300, 2, "0x1b"));
    batch.blocks.insert(305, Some(inclusion_block));

    let outcome = reconcile(&registry, &batch);

    let included: Vec<u64> = outcome
        .attestation_outcomes
        .iter()
        .filter(|outcome| outcome.included)
        .map(|outcome| outcome.validator_index)
        .collect();
    assert_eq!(included, vec![100, 400]);

    assert_eq!(
        outcome.events,
        vec![MonitorEvent::AttestationsMissed {
            label: "alpha".to_string(),
            validators: vec![300],
            slots: vec![300],
        }]
    );
}

#[test]
fn test_electra_multi_committee_aggregate() {
    // Slot 400 has four committees of sizes [2, 2, 3, 2]. committee_bits
    // 0x0a selects committees 1 and 3; aggregation bits 0x17 carry data bits
    // 1,1,1,0 across their seats.
    let registry = registry(&[("ops", &[11, 12, 31, 32])]);
    let mut batch = batch(399, 400);
    batch.committees.insert(
        400,
        vec![
            committee(400, 0, &[1, 2]),
            committee(400, 1, &[11, 12]),
            committee(400, 2, &[21, 22, 23]),
            committee(400, 3, &[31, 32]),
        ],
    );

    let mut inclusion_block = block(403, 7, None);
    inclusion_block
        .attestations
        .push(electra_attestation(400, "0x17", "0x0a"));
    batch.blocks.insert(403, Some(inclusion_block));

    let outcome = reconcile(&registry, &batch);

    let included: Vec<u64> = outcome
        .attestation_outcomes
        .iter()
        .filter(|outcome| outcome.included)
        .map(|outcome| outcome.validator_index)
        .collect();
    assert_eq!(included, vec![11, 12, 31]);

    assert_eq!(
        outcome.events,
        vec![MonitorEvent::AttestationsMissed {
            label: "ops".to_string(),
            validators: vec![32],
            slots: vec![400],
        }]
    );
}

#[test]
fn test_inclusion_at_window_edge_counts() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(499, 500);
    batch
        .committees
        .insert(500, vec![committee(500, 0, &[100])]);

    // Included exactly at s + 32.
    let mut inclusion_block = block(532, 7, None);
    inclusion_block.attestations.push(attestation(500, 0, "0x03"));
    batch.blocks.insert(532, Some(inclusion_block));

    let outcome = reconcile(&registry, &batch);
    assert!(outcome.events.is_empty());
    assert!(outcome.attestation_outcomes[0].included);
}

#[test]
fn test_inclusion_past_window_edge_is_missed() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(499, 500);
    batch
        .committees
        .insert(500, vec![committee(500, 0, &[100])]);

    // One slot past the window: never scanned.
    let mut late_block = block(533, 7, None);
    late_block.attestations.push(attestation(500, 0, "0x03"));
    batch.blocks.insert(533, Some(late_block));

    let outcome = reconcile(&registry, &batch);
    assert_eq!(
        outcome.events,
        vec![MonitorEvent::AttestationsMissed {
            label: "alpha".to_string(),
            validators: vec![100],
            slots: vec![500],
        }]
    );
}

#[test]
fn test_split_aggregates_merge_per_committee() {
    // The same (slot, committee) pair appears in two inclusion blocks with
    // complementary participation; the union covers both validators.
    let registry = registry(&[("alpha", &[100, 200])]);
    let mut batch = batch(299, 300);
    batch
        .committees
        .insert(300, vec![committee(300, 0, &[100, 200])]);

    let mut first = block(301, 7, None);
    first.attestations.push(attestation(300, 0, "0x05")); // bits 1,0
    batch.blocks.insert(301, Some(first));

    let mut second = block(302, 8, None);
    second.attestations.push(attestation(300, 0, "0x06")); // bits 0,1
    batch.blocks.insert(302, Some(second));

    let outcome = reconcile(&registry, &batch);
    assert!(outcome.events.is_empty());
    assert_eq!(outcome.attestation_outcomes.len(), 2);
    assert!(outcome.attestation_outcomes.iter().all(|o| o.included));
}

#[test]
fn test_missing_committees_skip_slot() {
    let registry = registry(&[("alpha", &[100])]);
    // Committees for slot 300 could not be fetched.
    let batch = batch(299, 300);

    let outcome = reconcile(&registry, &batch);
    assert!(outcome.events.is_empty());
    assert!(outcome.attestation_outcomes.is_empty());
    assert_eq!(outcome.skipped_slots, vec![300]);
}

#[test]
fn test_malformed_attestation_is_discarded_not_fatal() {
    let registry = registry(&[("alpha", &[100, 200])]);
    let mut batch = batch(299, 300);
    batch
        .committees
        .insert(300, vec![committee(300, 0, &[100, 200])]);

    let mut inclusion_block = block(301, 7, None);
    inclusion_block
        .attestations
        .push(attestation(300, 0, "0xzz")); // invalid hex
    inclusion_block.attestations.push(attestation(300, 0, "0x05")); // bits 1,0
    batch.blocks.insert(301, Some(inclusion_block));

    let outcome = reconcile(&registry, &batch);
    assert_eq!(outcome.decode_errors, 1);
    let included: Vec<u64> = outcome
        .attestation_outcomes
        .iter()
        .filter(|outcome| outcome.included)
        .map(|outcome| outcome.validator_index)
        .collect();
    assert_eq!(included, vec![100]);
}

#[test]
fn test_attestation_for_unknown_committee_index_is_discarded() {
    let registry = registry(&[("alpha", &[100])]);
    let mut batch = batch(299, 300);
    batch
        .committees
        .insert(300, vec![committee(300, 0, &[100])]);

    let mut inclusion_block = block(301, 7, None);
    // References committee 5, which does not exist at slot 300.
    inclusion_block.attestations.push(attestation(300, 5, "0x03"));
    batch.blocks.insert(301, Some(inclusion_block));

    let outcome = reconcile(&registry, &batch);
    assert_eq!(outcome.decode_errors, 1);
    assert_eq!(
        outcome.events,
        vec![MonitorEvent::AttestationsMissed {
            label: "alpha".to_string(),
            validators: vec![100],
            slots: vec![300],
        }]
    );
}

#[test]
fn test_withdrawals_are_batched_per_label() {
    let registry = registry(&[("alpha", &[100]), ("bravo", &[300])]);
    let mut batch = batch(199, 202);
    for slot in 200..=202 {
        batch.committees.insert(slot, Vec::new());
    }

    let mut first = block(200, 7, Some(900));
    first.withdrawals.push(withdrawal(0, 100, 1_000_000));
    first.withdrawals.push(withdrawal(1, 999, 7_000_000)); // unmonitored
    batch.blocks.insert(200, Some(first));

    let mut second = block(202, 8, Some(902));
    second.withdrawals.push(withdrawal(2, 300, 2_000_000));
    second.withdrawals.push(withdrawal(3, 100, 500_000));
    batch.blocks.insert(202, Some(second));

    let outcome = reconcile(&registry, &batch);

    assert_eq!(
        outcome.events,
        vec![
            MonitorEvent::WithdrawalsBatched {
                label: "alpha".to_string(),
                entries: vec![
                    WithdrawalEntry {
                        validator_index: 100,
                        amount_gwei: 1_000_000,
                        slot: 200,
                    },
                    WithdrawalEntry {
                        validator_index: 100,
                        amount_gwei: 500_000,
                        slot: 202,
                    },
                ],
                total_gwei: 1_500_000,
            },
            MonitorEvent::WithdrawalsBatched {
                label: "bravo".to_string(),
                entries: vec![WithdrawalEntry {
                    validator_index: 300,
                    amount_gwei: 2_000_000,
                    slot: 202,
                }],
                total_gwei: 2_000_000,
            },
        ]
    );
}

#[test]
fn test_event_order_within_batch() {
    // Proposer events (ascending slot), then grouped attestation misses,
    // then withdrawals.
    let registry = registry(&[("alpha", &[100, 200])]);
    let mut batch = batch(199, 202);
    batch.proposer_duties = vec![duty(202, 200), duty(200, 100)];
    for slot in 200..=202 {
        batch
            .committees
            .insert(slot, vec![committee(slot, 0, &[200])]);
    }

    let mut proposed = block(200, 100, Some(900));
    proposed.withdrawals.push(withdrawal(0, 100, 42));
    batch.blocks.insert(200, Some(proposed));
    batch.blocks.insert(202, None);

    let outcome = reconcile(&registry, &batch);

    let kinds: Vec<&str> = outcome.events.iter().map(|event| event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "block_proposed",
            "block_missed",
            "attestations_missed",
            "withdrawals_batched",
        ]
    );

    // Proposer events ascend by slot.
    assert!(matches!(
        &outcome.events[0],
        MonitorEvent::BlockProposed { slot: 200, .. }
    ));
    assert!(matches!(
        &outcome.events[1],
        MonitorEvent::BlockMissed { slot: 202, .. }
    ));
}

#[test]
fn test_attestation_outcomes_ascend_by_slot_then_validator() {
    let registry = registry(&[("alpha", &[100, 200])]);
    let mut batch = batch(299, 301);
    batch
        .committees
        .insert(300, vec![committee(300, 0, &[200, 100])]);
    batch
        .committees
        .insert(301, vec![committee(301, 0, &[100])]);

    let outcome = reconcile(&registry, &batch);
    let order: Vec<(u64, u64)> = outcome
        .attestation_outcomes
        .iter()
        .map(|outcome| (outcome.slot, outcome.validator_index))
        .collect();
    assert_eq!(order, vec![(300, 100), (300, 200), (301, 100)]);
}

#[test]
fn test_reconciliation_is_deterministic() {
    let registry = registry(&[("alpha", &[100, 300, 400])]);
    let mut batch = batch(299, 300);
    batch.proposer_duties = vec![duty(300, 100)];
    batch
        .committees
        .insert(300, vec![committee(300, 2, &[100, 200, 300, 400])]);
    batch.blocks.insert(300, Some(block(300, 100, Some(1))));

    let mut inclusion_block = block(305, 7, None);
    inclusion_block.attestations.push(attestation(300, 2, "0x1b"));
    batch.blocks.insert(305, Some(inclusion_block));

    let first = reconcile(&registry, &batch);
    let second = reconcile(&registry, &batch);
    assert_eq!(first.events, second.events);
    assert_eq!(first.attestation_outcomes, second.attestation_outcomes);
}
