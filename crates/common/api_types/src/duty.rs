use serde::{Deserialize, Serialize};

/// One entry of `GET /eth/v1/validator/duties/proposer/{epoch}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposerDutyData {
    pub pubkey: String,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
}
