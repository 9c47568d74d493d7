use serde::{Deserialize, Serialize};

/// One committee of `GET /eth/v1/beacon/states/{slot}/committees`.
/// Committees for a slot form an ordered sequence by `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeData {
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "serde_utils::quoted_u64_vec")]
    pub validators: Vec<u64>,
}
