use serde::{Deserialize, Serialize};

use crate::{attestation::AttestationView, withdrawal::Withdrawal};

/// Payload of `GET /eth/v2/beacon/blocks/{slot}`, reduced to the fields the
/// monitor reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBlockView {
    pub message: BlockMessageView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMessageView {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: u64,
    pub body: BlockBodyView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockBodyView {
    #[serde(default)]
    pub attestations: Vec<AttestationView>,
    /// Absent on pre-Bellatrix blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_payload: Option<ExecutionPayloadView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPayloadView {
    #[serde(with = "serde_utils::quoted_u64")]
    pub block_number: u64,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
}

/// Flattened block form consumed by the reconciler and held in the block
/// cache. A missed slot is represented by its absence (cache tombstone).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub slot: u64,
    pub proposer_index: u64,
    pub exec_block_number: Option<u64>,
    pub attestations: Vec<AttestationView>,
    pub withdrawals: Vec<Withdrawal>,
}

impl From<BlockMessageView> for BlockSummary {
    fn from(message: BlockMessageView) -> Self {
        let (exec_block_number, withdrawals) = match message.body.execution_payload {
            Some(payload) => (Some(payload.block_number), payload.withdrawals),
            None => (None, Vec::new()),
        };
        Self {
            slot: message.slot,
            proposer_index: message.proposer_index,
            exec_block_number,
            attestations: message.body.attestations,
            withdrawals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::DataResponse;

    #[test]
    fn test_block_flattens_execution_payload() {
        let raw = r#"{
            "version": "electra",
            "data": {
                "message": {
                    "slot": "6401",
                    "proposer_index": "100",
                    "parent_root": "0x00",
                    "state_root": "0x00",
                    "body": {
                        "attestations": [
                            {
                                "aggregation_bits": "0x1b",
                                "data": { "slot": "6400", "index": "2", "beacon_block_root": "0x00" },
                                "committee_bits": "0x0a"
                            }
                        ],
                        "execution_payload": {
                            "block_number": "500",
                            "withdrawals": [
                                {
                                    "index": "7",
                                    "validator_index": "100",
                                    "address": "0x9fc3da866e7df3a1c57ade1a97c9f00a70f010c8",
                                    "amount": "1000000"
                                }
                            ]
                        }
                    }
                },
                "signature": "0x00"
            }
        }"#;

        let response: DataResponse<SignedBlockView> = serde_json::from_str(raw).unwrap();
        let summary = BlockSummary::from(response.data.message);
        assert_eq!(summary.slot, 6401);
        assert_eq!(summary.exec_block_number, Some(500));
        assert_eq!(summary.attestations.len(), 1);
        assert_eq!(
            summary.attestations[0].committee_bits.as_deref(),
            Some("0x0a")
        );
        assert_eq!(summary.withdrawals[0].amount, 1000000);
    }

    #[test]
    fn test_pre_bellatrix_block_has_no_execution_payload() {
        let raw = r#"{
            "message": {
                "slot": "200",
                "proposer_index": "3",
                "body": { "attestations": [] }
            }
        }"#;

        let block: SignedBlockView = serde_json::from_str(raw).unwrap();
        let summary = BlockSummary::from(block.message);
        assert_eq!(summary.exec_block_number, None);
        assert!(summary.withdrawals.is_empty());
    }
}
